// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::process::Demographic;

/// Failures while turning one report file into a `Dataset`.
///
/// Decoding and structural parsing never show up here: both fall back to a
/// lenient strategy instead of failing.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not find header row in {}", .path.display())]
    HeaderNotFound { path: PathBuf },

    #[error("reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{demographic} report")]
    Extract {
        demographic: Demographic,
        #[source]
        source: ExtractError,
    },

    #[error("no {demographic} report matching {pattern}")]
    InputNotFound {
        demographic: Demographic,
        pattern: String,
    },

    #[error("several {demographic} reports match: {}", join_paths(.candidates))]
    AmbiguousInput {
        demographic: Demographic,
        candidates: Vec<PathBuf>,
    },

    #[error("invalid glob pattern {pattern}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("writing {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing csv")]
    Csv(#[from] csv::Error),

    #[error("building arrow batch")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("writing parquet")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("serializing summary")]
    Json(#[from] serde_json::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
