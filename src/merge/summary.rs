use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{CombinedTable, FIELD_PREFIXES};
use crate::process::Demographic;

/// Sums of the present values of one year column group. Sums saturate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotals {
    pub year: String,
    pub total: i128,
    pub men: i128,
    pub women: i128,
    pub canadian: i128,
    pub international: i128,
}

/// What a run produced, for whoever wants to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub institutions: usize,
    pub years: Vec<String>,
    /// Reports that went into the merge.
    pub inputs: Vec<Demographic>,
    /// Value column groups present in the output.
    pub data_types: Vec<String>,
    pub year_totals: Vec<YearTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub generated_at: DateTime<Utc>,
}

impl Summary {
    pub fn from_table(table: &CombinedTable) -> Self {
        let year_totals = table
            .years
            .iter()
            .enumerate()
            .map(|(pos, year)| {
                let mut sums = [0i128; 5];
                for row in &table.rows {
                    if let Some(values) = row.years.get(pos) {
                        for (sum, v) in sums.iter_mut().zip(values.fields()) {
                            *sum = sum.saturating_add(v.unwrap_or(0));
                        }
                    }
                }
                let [total, men, women, canadian, international] = sums;
                YearTotals {
                    year: year.clone(),
                    total,
                    men,
                    women,
                    canadian,
                    international,
                }
            })
            .collect();

        Self {
            institutions: table.rows.len(),
            years: table.years.clone(),
            inputs: Demographic::ALL.to_vec(),
            data_types: FIELD_PREFIXES.iter().map(|p| p.to_string()).collect(),
            year_totals,
            output: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Totals for `year`, or for the last year when `year` is `None`.
    pub fn totals_for(&self, year: Option<&str>) -> Option<&YearTotals> {
        match year {
            Some(y) => self.year_totals.iter().find(|t| t.year == y),
            None => self.year_totals.last(),
        }
    }
}
