/// Trim whitespace and drop every literal double quote.
pub fn clean_str(raw: &str) -> String {
    raw.trim().replace('"', "")
}

/// Parse an enrollment count cell.
///
/// Thousands separators and quotes are stripped first; what is left must be a
/// non-empty run of ASCII digits. Anything else (blank cells, `..`, `x`,
/// footnote markers, negative numbers) is absent rather than an error.
pub fn parse_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '"').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<u64>().ok()
}
