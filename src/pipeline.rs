// src/pipeline.rs
use std::path::PathBuf;
use tracing::{info, info_span};

use crate::{
    discover::ReportPaths,
    error::{PipelineError, Result},
    export::{stage_summary_json, stage_table, OutputFormat},
    merge::{merge, CombinedTable, Summary},
    process::{extract_file, Dataset, Demographic},
};

/// Everything one run needs, independent of how it was configured.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub reports: ReportPaths,
    pub output: PathBuf,
    /// Falls back to the output extension when unset.
    pub format: Option<OutputFormat>,
    pub summary_json: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output))
    }
}

fn load(reports: &ReportPaths, demographic: Demographic) -> Result<Dataset> {
    let path = reports.get(demographic);
    let _span = info_span!("report", %demographic).entered();
    extract_file(path, demographic).map_err(|source| PipelineError::Extract {
        demographic,
        source,
    })
}

/// Extract the three reports in order and merge them. Nothing is written.
pub fn combine(reports: &ReportPaths) -> Result<CombinedTable> {
    let total = load(reports, Demographic::Total)?;
    let men = load(reports, Demographic::Men)?;
    let domestic = load(reports, Demographic::Domestic)?;

    info!("combining data");
    Ok(merge(&total, &men, &domestic))
}

/// Full run: extract, merge, write the table (and the summary JSON if
/// asked for). Every output is staged before any destination is renamed, so
/// a failure while extracting, merging or writing leaves the destinations
/// untouched.
pub fn run(config: &PipelineConfig) -> Result<(CombinedTable, Summary)> {
    // ─── 1) extract + merge ───────────────────────────────────────
    let table = combine(&config.reports)?;
    let format = config.output_format();
    let summary = Summary::from_table(&table).with_output(&config.output);

    // ─── 2) stage every output into temp files ────────────────────
    let staged_table = stage_table(&table, &config.output, format)?;
    let staged_summary = match &config.summary_json {
        Some(path) => Some(stage_summary_json(&summary, path)?),
        None => None,
    };

    // ─── 3) rename into place ─────────────────────────────────────
    staged_table.commit()?;
    info!(
        path = %config.output.display(),
        format = %format,
        rows = table.rows.len(),
        "wrote combined table"
    );
    if let Some(staged) = staged_summary {
        let path = staged.destination().to_path_buf();
        staged.commit()?;
        info!(path = %path.display(), "wrote summary");
    }
    Ok((table, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use anyhow::Result;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn report(years: &[&str], rows: &[(&str, &[&str])]) -> String {
        let mut out = String::from("\"Postsecondary enrolments\"\n\"Frequency: Annual\"\n");
        out.push_str("\"Geography and institutions, program type, credential type and gender\"");
        for y in years {
            out.push_str(&format!(",\"{}\"", y));
        }
        out.push('\n');
        out.push_str(&",\"Number\"".repeat(years.len()));
        out.push('\n');
        for (name, values) in rows {
            out.push_str(&format!("\"{}\"", name));
            for v in *values {
                out.push_str(&format!(",\"{}\"", v));
            }
            out.push('\n');
        }
        out.push_str("\"Symbol legend:\"\n");
        out
    }

    fn write_reports(dir: &Path, total: &str, men: &str, domestic: &str) -> Result<ReportPaths> {
        let reports = ReportPaths {
            total: dir.join("r-total-total.csv"),
            men: dir.join("r-total-men.csv"),
            domestic: dir.join("r-total-canadian.csv"),
        };
        fs::write(&reports.total, total)?;
        fs::write(&reports.men, men)?;
        fs::write(&reports.domestic, domestic)?;
        Ok(reports)
    }

    const YEARS: [&str; 2] = ["2020 / 2021", "2021 / 2022"];

    #[test]
    fn end_to_end_csv() -> Result<()> {
        let dir = tempdir()?;
        let reports = write_reports(
            dir.path(),
            &report(&YEARS, &[("Zeta College", &["1,000", "1,100"]), ("Alpha University", &["2,500", ".."])]),
            &report(&YEARS, &[("Alpha University", &["1,200", "1,250"])]),
            &report(&YEARS, &[("Zeta College", &["900", "950"]), ("Beta Institute", &["40", ""])]),
        )?;
        let config = PipelineConfig {
            reports,
            output: dir.path().join("out/combined.csv"),
            format: None,
            summary_json: Some(dir.path().join("out/summary.json")),
        };

        let (table, summary) = run(&config)?;
        assert_eq!(
            table.institutions().collect::<Vec<_>>(),
            vec!["Alpha University", "Beta Institute", "Zeta College"]
        );
        assert_eq!(summary.institutions, 3);
        assert_eq!(summary.years, YEARS.to_vec());

        let text = fs::read_to_string(&config.output)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "Alpha University,2500,1200,1300,,,,1250,,,");
        assert_eq!(lines[2], "Beta Institute,,,,40,,,,,,");
        assert_eq!(lines[3], "Zeta College,1000,,,900,100,1100,,,950,150");

        assert!(config.summary_json.as_ref().unwrap().exists());
        Ok(())
    }

    #[test]
    fn missing_header_aborts_without_output() -> Result<()> {
        let dir = tempdir()?;
        let good = report(&YEARS, &[("A", &["1", "2"])]);
        let reports = write_reports(dir.path(), &good, "no header in here\n1,2\n", &good)?;
        let config = PipelineConfig {
            reports,
            output: dir.path().join("combined.csv"),
            format: Some(OutputFormat::Csv),
            summary_json: None,
        };

        let err = run(&config).unwrap_err();
        match &err {
            PipelineError::Extract {
                demographic,
                source: ExtractError::HeaderNotFound { path },
            } => {
                assert_eq!(*demographic, Demographic::Men);
                assert!(path.ends_with("r-total-men.csv"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!config.output.exists());
        Ok(())
    }

    #[test]
    fn failing_summary_leaves_no_table() -> Result<()> {
        let dir = tempdir()?;
        let good = report(&YEARS, &[("A", &["1", "2"])]);
        let reports = write_reports(dir.path(), &good, &good, &good)?;
        let blocked = dir.path().join("summary.json");
        fs::create_dir(&blocked)?;
        fs::write(blocked.join("other.txt"), "occupied")?;

        let config = PipelineConfig {
            reports,
            output: dir.path().join("combined.csv"),
            format: None,
            summary_json: Some(blocked.clone()),
        };

        let err = run(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Io { ref path, .. } if path == &blocked));
        assert!(!config.output.exists());
        let temps = fs::read_dir(dir.path())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(temps, 0);
        assert_eq!(fs::read_to_string(blocked.join("other.txt"))?, "occupied");
        Ok(())
    }

    #[test]
    fn format_follows_extension_unless_set() {
        let reports = ReportPaths {
            total: "t".into(),
            men: "m".into(),
            domestic: "d".into(),
        };
        let mut config = PipelineConfig {
            reports,
            output: "combined.parquet".into(),
            format: None,
            summary_json: None,
        };
        assert_eq!(config.output_format(), OutputFormat::Parquet);
        config.format = Some(OutputFormat::Csv);
        assert_eq!(config.output_format(), OutputFormat::Csv);
    }
}
