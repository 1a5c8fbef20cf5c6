// src/process/parse.rs
use csv::ReaderBuilder;
use thiserror::Error;
use tracing::debug;

use super::raw_table::RawTable;

/// A strategy could not make a table out of the text.
#[derive(Debug, Error)]
#[error("structural parse failed: {0}")]
pub struct ParseFailure(#[from] csv::Error);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Whole text through the csv reader; every record must have the same
    /// number of fields.
    Structured,
    /// Line by line, each line through the csv reader so quoted commas stay
    /// inside their field, then padded to the widest row.
    ManualSplit,
}

/// Strategies in the order they are tried. The last one cannot fail.
pub const PARSE_CHAIN: [ParseStrategy; 2] = [ParseStrategy::Structured, ParseStrategy::ManualSplit];

impl ParseStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ParseStrategy::Structured => "structured",
            ParseStrategy::ManualSplit => "manual split",
        }
    }

    pub fn parse(&self, text: &str) -> Result<RawTable, ParseFailure> {
        match self {
            ParseStrategy::Structured => parse_structured(text),
            ParseStrategy::ManualSplit => Ok(parse_manual(text)),
        }
    }
}

fn parse_structured(text: &str) -> Result<RawTable, ParseFailure> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable::new(rows))
}

fn parse_manual(text: &str) -> RawTable {
    let rows = text.lines().map(split_line).collect();
    RawTable::padded(rows)
}

/// Split one line on commas, honouring double quotes. A line the reader
/// rejects becomes a single trimmed cell.
fn split_line(line: &str) -> Vec<String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match rdr.records().next() {
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        Some(Err(_)) => vec![line.trim().to_string()],
        None => Vec::new(),
    }
}

/// Try each strategy of `chain` in turn; `None` only if every one failed.
pub fn parse_with(text: &str, chain: &[ParseStrategy]) -> Option<(RawTable, ParseStrategy)> {
    for strategy in chain {
        match strategy.parse(text) {
            Ok(table) => return Some((table, *strategy)),
            Err(e) => debug!(strategy = strategy.name(), error = %e, "parse failed, trying next"),
        }
    }
    None
}

/// Parse decoded report text into a rectangular [`RawTable`]. Never fails.
pub fn parse_table(text: &str) -> (RawTable, ParseStrategy) {
    parse_with(text, &PARSE_CHAIN)
        .unwrap_or_else(|| (parse_manual(text), ParseStrategy::ManualSplit))
}
