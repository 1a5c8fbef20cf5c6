use serde::{Deserialize, Serialize};
use std::fmt;

/// Which report a dataset was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Demographic {
    Total,
    Men,
    Domestic,
}

impl Demographic {
    pub const ALL: [Demographic; 3] = [Demographic::Total, Demographic::Men, Demographic::Domestic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Demographic::Total => "total",
            Demographic::Men => "men",
            Demographic::Domestic => "domestic",
        }
    }
}

impl fmt::Display for Demographic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One institution row of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub institution: String,
    /// One entry per year label of the owning [`Dataset`], same order.
    pub counts: Vec<Option<u64>>,
}

impl Record {
    pub fn has_data(&self) -> bool {
        self.counts.iter().any(Option::is_some)
    }
}

/// A cleaned report: year labels in header order plus its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub demographic: Demographic,
    pub years: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Position of the first year column labelled `label`.
    pub fn year_index(&self, label: &str) -> Option<usize> {
        self.years.iter().position(|y| y == label)
    }

    /// Count for `record` under `label`, looked up by label text.
    pub fn count(&self, record: &Record, label: &str) -> Option<u64> {
        self.year_index(label)
            .and_then(|idx| record.counts.get(idx).copied().flatten())
    }

    pub fn institutions(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.institution.as_str())
    }
}
