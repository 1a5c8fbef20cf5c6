// src/process/extract.rs
use std::{fs, path::Path};
use tracing::{debug, info, warn};

use super::{
    dataset::{Dataset, Demographic, Record},
    decode::decode_text,
    parse::parse_table,
    raw_table::RawTable,
    utils::{clean_str, parse_count},
};
use crate::error::ExtractError;

/// Text that marks the header row of a report.
pub const HEADER_MARKER: &str = "Geography and institutions";

/// First-column fragments that mark section breaks and sub-headers rather
/// than institutions. Matched against the lowercased cell.
pub const SKIP_KEYWORDS: [&str; 6] = [
    "field of study",
    "program type",
    "credential",
    "registration",
    "status",
    "gender",
];

/// Rows between the header and the first data row (the units row).
const UNITS_ROWS: usize = 1;

/// Index of the first row holding a cell that contains [`HEADER_MARKER`],
/// scanning row by row and left to right within a row.
pub fn find_header_row(table: &RawTable) -> Option<usize> {
    table
        .rows
        .iter()
        .position(|row| row.iter().any(|cell| cell.contains(HEADER_MARKER)))
}

/// Year labels from the header row, skipping the institution column.
/// Duplicates are kept; each stays a separate positional column.
pub fn year_labels(header: &[String]) -> Vec<String> {
    header
        .iter()
        .skip(1)
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty() && cell.contains('/'))
        .map(str::to_string)
        .collect()
}

fn is_skipped(first_cell: &str) -> bool {
    if first_cell.trim().is_empty() {
        return true;
    }
    let lower = first_cell.to_lowercase();
    SKIP_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Build a record from one data row, or `None` if the row is a sub-header,
/// blank, or carries no counts at all.
fn parse_row(row: &[String], year_count: usize) -> Option<Record> {
    let first = row.first()?;
    if is_skipped(first) {
        return None;
    }
    let institution = clean_str(first);
    if institution.is_empty() {
        return None;
    }

    let counts = (1..=year_count)
        .map(|col| row.get(col).and_then(|cell| parse_count(cell)))
        .collect();
    let record = Record {
        institution,
        counts,
    };
    record.has_data().then_some(record)
}

/// Recover a dataset from an already parsed table.
///
/// `source` only names the input in the error if no header row exists.
pub fn extract_table(
    table: &RawTable,
    demographic: Demographic,
    source: &Path,
) -> Result<Dataset, ExtractError> {
    let header_idx = find_header_row(table).ok_or_else(|| ExtractError::HeaderNotFound {
        path: source.to_path_buf(),
    })?;
    let header = table.row(header_idx).unwrap_or_default();
    let years = year_labels(header);
    if years.is_empty() {
        warn!(row = header_idx, "header row has no year columns");
    }

    let data_start = header_idx + 1 + UNITS_ROWS;
    let records: Vec<Record> = table
        .rows
        .iter()
        .skip(data_start)
        .filter_map(|row| parse_row(row, years.len()))
        .collect();

    debug!(
        header_row = header_idx,
        years = ?years,
        records = records.len(),
        "extracted table"
    );

    Ok(Dataset {
        demographic,
        years,
        records,
    })
}

/// Decode, parse and extract report bytes. Pure: the same bytes always give
/// the same dataset.
pub fn extract_bytes(
    bytes: &[u8],
    demographic: Demographic,
    source: &Path,
) -> Result<Dataset, ExtractError> {
    let (text, encoding) = decode_text(bytes);
    let (table, strategy) = parse_table(&text);
    debug!(
        encoding = encoding.name(),
        parser = strategy.name(),
        rows = table.len(),
        width = table.width(),
        "parsed report"
    );
    extract_table(&table, demographic, source)
}

/// Read one report file from disk and extract it.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn extract_file<P: AsRef<Path>>(
    path: P,
    demographic: Demographic,
) -> Result<Dataset, ExtractError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = extract_bytes(&bytes, demographic, path)?;
    info!(
        institutions = dataset.records.len(),
        years = dataset.years.len(),
        "extracted {} report",
        demographic
    );
    Ok(dataset)
}
