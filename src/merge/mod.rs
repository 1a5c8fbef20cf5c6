// src/merge/mod.rs
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

use crate::process::Dataset;

pub mod summary;

pub use summary::{Summary, YearTotals};

/// Column label for the institution name.
pub const INSTITUTION_COLUMN: &str = "Institution";

/// Per-year column prefixes, in output order.
pub const FIELD_PREFIXES: [&str; 5] = ["Total", "Men", "Women", "Canadian", "International"];

/// One year of one institution. Derived fields are signed and wide enough
/// for any difference of two counts, so they may go negative when the
/// source reports disagree but are never lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearValues {
    pub total: Option<u64>,
    pub men: Option<u64>,
    pub women: Option<i128>,
    pub domestic: Option<u64>,
    pub international: Option<i128>,
}

impl YearValues {
    pub fn new(total: Option<u64>, men: Option<u64>, domestic: Option<u64>) -> Self {
        Self {
            total,
            men,
            women: difference(total, men),
            domestic,
            international: difference(total, domestic),
        }
    }

    /// Values in [`FIELD_PREFIXES`] order.
    pub fn fields(&self) -> [Option<i128>; 5] {
        [
            self.total.map(i128::from),
            self.men.map(i128::from),
            self.women,
            self.domestic.map(i128::from),
            self.international,
        ]
    }
}

/// `a - b` when both sides are known, never clamped.
pub fn difference(a: Option<u64>, b: Option<u64>) -> Option<i128> {
    Some(i128::from(a?) - i128::from(b?))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedRow {
    pub institution: String,
    /// One entry per reference year, same order as [`CombinedTable::years`].
    pub years: Vec<YearValues>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedTable {
    pub years: Vec<String>,
    pub rows: Vec<CombinedRow>,
}

impl CombinedTable {
    /// `Institution`, then five columns per year.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(1 + self.years.len() * FIELD_PREFIXES.len());
        names.push(INSTITUTION_COLUMN.to_string());
        for year in &self.years {
            for prefix in FIELD_PREFIXES {
                names.push(format!("{}_{}", prefix, year));
            }
        }
        names
    }

    pub fn institutions(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.institution.as_str())
    }
}

/// Record indices of a dataset grouped by institution, in input order.
/// Popping from the front pairs the n-th occurrence of a name in one
/// dataset with the n-th occurrence in another.
struct Occurrences<'a> {
    queues: HashMap<&'a str, VecDeque<usize>>,
    used: Vec<bool>,
}

impl<'a> Occurrences<'a> {
    fn new(ds: &'a Dataset) -> Self {
        let mut queues: HashMap<&str, VecDeque<usize>> = HashMap::new();
        for (idx, rec) in ds.records.iter().enumerate() {
            queues.entry(rec.institution.as_str()).or_default().push_back(idx);
        }
        Self {
            queues,
            used: vec![false; ds.records.len()],
        }
    }

    fn take(&mut self, institution: &str) -> Option<usize> {
        let idx = self.queues.get_mut(institution)?.pop_front()?;
        self.used[idx] = true;
        Some(idx)
    }

    fn is_used(&self, idx: usize) -> bool {
        self.used[idx]
    }
}

fn warn_missing_years(reference: &[String], other: &Dataset) {
    for year in reference {
        if other.year_index(year).is_none() {
            warn!(
                demographic = %other.demographic,
                year = %year,
                "year column missing; values treated as absent"
            );
        }
    }
}

/// Full outer join of the three reports on institution name, with derived
/// women and international columns, sorted by institution.
///
/// Year order comes from the first argument; the other two are matched to it
/// by label text. Arguments are positional, the `demographic` tags of the
/// datasets are not consulted.
pub fn merge(total: &Dataset, men: &Dataset, domestic: &Dataset) -> CombinedTable {
    let years = total.years.clone();
    warn_missing_years(&years, men);
    warn_missing_years(&years, domestic);

    let mut men_occ = Occurrences::new(men);
    let mut dom_occ = Occurrences::new(domestic);

    let build = |institution: &str,
                 t: Option<usize>,
                 m: Option<usize>,
                 d: Option<usize>|
     -> CombinedRow {
        let values = years
            .iter()
            .enumerate()
            .map(|(pos, year)| {
                let t = t.and_then(|i| total.records[i].counts.get(pos).copied().flatten());
                let m = m.and_then(|i| men.count(&men.records[i], year));
                let d = d.and_then(|i| domestic.count(&domestic.records[i], year));
                YearValues::new(t, m, d)
            })
            .collect();
        CombinedRow {
            institution: institution.to_string(),
            years: values,
        }
    };

    let mut rows = Vec::new();
    for (t_idx, rec) in total.records.iter().enumerate() {
        let m = men_occ.take(&rec.institution);
        let d = dom_occ.take(&rec.institution);
        rows.push(build(rec.institution.as_str(), Some(t_idx), m, d));
    }
    for (m_idx, rec) in men.records.iter().enumerate() {
        if men_occ.is_used(m_idx) {
            continue;
        }
        let d = dom_occ.take(&rec.institution);
        rows.push(build(rec.institution.as_str(), None, Some(m_idx), d));
    }
    for (d_idx, rec) in domestic.records.iter().enumerate() {
        if dom_occ.is_used(d_idx) {
            continue;
        }
        rows.push(build(rec.institution.as_str(), None, None, Some(d_idx)));
    }

    // stable: duplicate names keep their join order
    rows.sort_by(|a, b| a.institution.cmp(&b.institution));

    debug!(rows = rows.len(), years = years.len(), "merged reports");
    CombinedTable { years, rows }
}
