use anyhow::{Context, Result};
use clap::Parser;
use enrollmerge::{
    discover::resolve_reports,
    export::OutputFormat,
    merge::{CombinedTable, Summary, FIELD_PREFIXES},
    pipeline::{run, PipelineConfig},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "enrollmerge")]
#[command(about = "Combine total, men and Canadian enrollment reports into one table")]
struct Args {
    /// Directory holding the three downloaded reports (*-total.csv, *-men.csv, *-canadian.csv)
    #[arg(long, env = "ENROLLMERGE_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Total enrollment report
    #[arg(long)]
    total: Option<PathBuf>,

    /// Men enrollment report
    #[arg(long)]
    men: Option<PathBuf>,

    /// Domestic (Canadian) student report
    #[arg(long, visible_alias = "canadian")]
    domestic: Option<PathBuf>,

    /// Combined output file
    #[arg(
        short,
        long,
        env = "ENROLLMERGE_OUTPUT",
        default_value = "combined_university_enrollment.csv"
    )]
    output: PathBuf,

    /// Output format: csv or parquet (default: from the output extension)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Also write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Number of combined rows to show after the run
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Year whose totals are shown (default: the latest year)
    #[arg(long)]
    sample_year: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// 1234567 -> "1,234,567"
fn with_separators(n: i128) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

fn print_summary(summary: &Summary, table: &CombinedTable, args: &Args) {
    if let Some(path) = &summary.output {
        println!("Combined data saved to {}", path.display());
    }
    println!();
    println!("Summary:");
    println!("Total institutions: {}", summary.institutions);
    println!("Years covered: {}", summary.years.join(", "));
    println!("Data types included: {}", summary.data_types.join(", "));

    if args.preview > 0 && !table.rows.is_empty() {
        println!();
        println!("First {} rows of combined data:", args.preview.min(table.rows.len()));
        let year = table.years.last().map(String::as_str).unwrap_or("");
        for row in table.rows.iter().take(args.preview) {
            let fields = row.years.last().map(|v| v.fields()).unwrap_or_default();
            let cells: Vec<String> = FIELD_PREFIXES
                .iter()
                .zip(fields)
                .map(|(name, v)| match v {
                    Some(n) => format!("{}={}", name, n),
                    None => format!("{}=", name),
                })
                .collect();
            println!("  {} [{}] {}", row.institution, year, cells.join(" "));
        }
    }

    match summary.totals_for(args.sample_year.as_deref()) {
        Some(t) => {
            println!();
            println!("Enrollment totals for {}:", t.year);
            println!("Total students: {}", with_separators(t.total));
            println!("Men: {}", with_separators(t.men));
            println!("Women: {}", with_separators(t.women));
            println!("Canadian: {}", with_separators(t.canadian));
            println!("International: {}", with_separators(t.international));
        }
        None => {
            if let Some(y) = &args.sample_year {
                println!();
                println!("No data for year {}", y);
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) locate the three reports ─────────────────────────────────
    let reports = resolve_reports(
        args.input_dir.as_deref(),
        args.total.clone(),
        args.men.clone(),
        args.domestic.clone(),
    )
    .context("locating input reports")?;

    // ─── 3) extract, merge, write ────────────────────────────────────
    let config = PipelineConfig {
        reports,
        output: args.output.clone(),
        format: args.format,
        summary_json: args.summary_json.clone(),
    };

    let (table, summary) = run(&config).with_context(|| {
        format!(
            "combining reports into {}; check the file paths and that each file is a StatCan enrollment table",
            config.output.display()
        )
    })?;

    // ─── 4) report ──────────────────────────────────────────────────
    print_summary(&summary, &table, &args);
    info!("all done");
    Ok(())
}
