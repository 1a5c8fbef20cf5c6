// src/export/mod.rs
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};

use crate::{
    error::{PipelineError, Result},
    merge::{CombinedTable, Summary},
};

pub mod csv_writer;
pub mod parquet_writer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    /// `.parquet` means Parquet, anything else CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => OutputFormat::Parquet,
            _ => OutputFormat::Csv,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(format!("unknown output format `{}` (expected csv or parquet)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => f.write_str("csv"),
            OutputFormat::Parquet => f.write_str("parquet"),
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A fully written hidden temp file waiting to be renamed over its
/// destination. Dropping it without [`StagedFile::commit`] removes the temp
/// file and leaves the destination untouched.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Rename the temp file into place.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.dest).map_err(io_err(&self.dest))?;
        self.committed = true;
        debug!(path = %self.dest.display(), "renamed temp file into place");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Write `dest`'s content into a hidden temp file in the same directory.
/// Nothing at `dest` changes until the returned file is committed.
pub(crate) fn stage<F>(dest: &Path, write: F) -> Result<StagedFile>
where
    F: FnOnce(File) -> Result<()>,
{
    if dest.is_dir() {
        return Err(PipelineError::Io {
            path: dest.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "destination is a directory"),
        });
    }

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let tmp_path = dir.join(format!(".{}.tmp", file_name));
    let tmp = File::create(&tmp_path).map_err(io_err(&tmp_path))?;

    let staged = StagedFile {
        tmp: tmp_path,
        dest: dest.to_path_buf(),
        committed: false,
    };
    write(tmp)?;
    Ok(staged)
}

/// Stage the combined table for `dest` in `format`.
pub fn stage_table(table: &CombinedTable, dest: &Path, format: OutputFormat) -> Result<StagedFile> {
    let staged = match format {
        OutputFormat::Csv => stage(dest, |file| csv_writer::write_csv(table, file, dest))?,
        OutputFormat::Parquet => stage(dest, |file| parquet_writer::write_parquet(table, file))?,
    };
    debug!(path = %dest.display(), format = %format, "staged combined table");
    Ok(staged)
}

/// Stage the summary as pretty JSON with a trailing newline.
pub fn stage_summary_json(summary: &Summary, dest: &Path) -> Result<StagedFile> {
    stage(dest, |mut file| {
        serde_json::to_writer_pretty(&mut file, summary)?;
        file.write_all(b"\n").map_err(io_err(dest))?;
        Ok(())
    })
}

/// Write the combined table to `dest` in `format`.
pub fn write_table(table: &CombinedTable, dest: &Path, format: OutputFormat) -> Result<()> {
    stage_table(table, dest, format)?.commit()?;
    info!(
        path = %dest.display(),
        format = %format,
        rows = table.rows.len(),
        "wrote combined table"
    );
    Ok(())
}

/// Pretty JSON with a trailing newline.
pub fn write_summary_json(summary: &Summary, dest: &Path) -> Result<()> {
    stage_summary_json(summary, dest)?.commit()?;
    info!(path = %dest.display(), "wrote summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{CombinedRow, YearValues};
    use anyhow::Result;
    use tempfile::tempdir;

    pub(crate) fn sample_table() -> CombinedTable {
        CombinedTable {
            years: vec!["2020 / 2021".into()],
            rows: vec![
                CombinedRow {
                    institution: "A, University of".into(),
                    years: vec![YearValues::new(Some(1234), Some(500), None)],
                },
                CombinedRow {
                    institution: "B".into(),
                    years: vec![YearValues::new(Some(10), Some(12), Some(3))],
                },
            ],
        }
    }

    #[test]
    fn format_from_flag_and_extension() {
        assert_eq!("CSV".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!("parquet".parse::<OutputFormat>(), Ok(OutputFormat::Parquet));
        assert!("xlsx".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::from_path(Path::new("out.PARQUET")), OutputFormat::Parquet);
        assert_eq!(OutputFormat::from_path(Path::new("out.csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Csv);
    }

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp() -> Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("nested/deeper/combined.csv");
        write_table(&sample_table(), &dest, OutputFormat::Csv)?;

        assert!(dest.exists());
        let leftovers: Vec<_> = fs::read_dir(dest.parent().unwrap())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn failed_write_leaves_no_destination() -> Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("combined.csv");
        let res = stage(&dest, |_file| {
            Err(PipelineError::Io {
                path: dest.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
            })
        });
        assert!(res.is_err());
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn dropped_stage_leaves_nothing_behind() -> Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("combined.csv");
        let staged = stage_table(&sample_table(), &dest, OutputFormat::Csv)?;
        assert_eq!(staged.destination(), dest.as_path());
        assert!(!dest.exists());
        drop(staged);
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn directory_destination_is_refused_before_writing() -> Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("taken");
        fs::create_dir(&dest)?;
        fs::write(dest.join("keep.txt"), "x")?;

        let err = stage_summary_json(&Summary::from_table(&sample_table()), &dest).unwrap_err();
        assert!(matches!(err, PipelineError::Io { ref path, .. } if path == &dest));
        let names: Vec<_> = fs::read_dir(dir.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("taken")]);
        Ok(())
    }

    #[test]
    fn summary_json_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let dest = dir.path().join("summary.json");
        let summary = Summary::from_table(&sample_table());
        write_summary_json(&summary, &dest)?;

        let text = fs::read_to_string(&dest)?;
        assert!(text.ends_with("}\n"));
        let back: Summary = serde_json::from_str(&text)?;
        assert_eq!(back, summary);
        Ok(())
    }
}
