// src/discover.rs
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{
    error::{PipelineError, Result},
    process::Demographic,
};

/// File name suffixes a downloaded report may carry, e.g.
/// `3710023403-eng-total-men.csv`.
pub fn suffixes(demographic: Demographic) -> &'static [&'static str] {
    match demographic {
        Demographic::Total => &["total"],
        Demographic::Men => &["men"],
        Demographic::Domestic => &["canadian", "domestic"],
    }
}

/// The three report paths of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub total: PathBuf,
    pub men: PathBuf,
    pub domestic: PathBuf,
}

impl ReportPaths {
    pub fn get(&self, demographic: Demographic) -> &Path {
        match demographic {
            Demographic::Total => &self.total,
            Demographic::Men => &self.men,
            Demographic::Domestic => &self.domestic,
        }
    }
}

/// Find the single report in `dir` for `demographic`.
pub fn find_report(dir: &Path, demographic: Demographic) -> Result<PathBuf> {
    let base = Pattern::escape(&dir.display().to_string());
    let mut candidates = Vec::new();
    let mut patterns = Vec::new();

    for suffix in suffixes(demographic) {
        let pattern = format!("{}/*-{}.csv", base, suffix);
        let entries = glob(&pattern).map_err(|source| PipelineError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in entries {
            if let Ok(path) = entry {
                if path.is_file() {
                    candidates.push(path);
                }
            }
        }
        patterns.push(pattern);
    }

    candidates.sort();
    candidates.dedup();
    debug!(%demographic, ?candidates, "report candidates");

    match candidates.len() {
        0 => Err(PipelineError::InputNotFound {
            demographic,
            pattern: patterns.join(" or "),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(PipelineError::AmbiguousInput {
            demographic,
            candidates,
        }),
    }
}

/// Resolve every report, preferring explicit paths over directory lookup.
pub fn resolve_reports(
    dir: Option<&Path>,
    total: Option<PathBuf>,
    men: Option<PathBuf>,
    domestic: Option<PathBuf>,
) -> Result<ReportPaths> {
    let pick = |explicit: Option<PathBuf>, demographic| match (explicit, dir) {
        (Some(p), _) => Ok(p),
        (None, Some(d)) => find_report(d, demographic),
        (None, None) => Err(PipelineError::InputNotFound {
            demographic,
            pattern: format!("--{} or --input-dir", demographic),
        }),
    };

    Ok(ReportPaths {
        total: pick(total, Demographic::Total)?,
        men: pick(men, Demographic::Men)?,
        domestic: pick(domestic, Demographic::Domestic)?,
    })
}
