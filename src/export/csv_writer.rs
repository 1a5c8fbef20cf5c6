use csv::WriterBuilder;
use std::{io::Write, path::Path};

use crate::{
    error::{PipelineError, Result},
    merge::CombinedTable,
};

fn cell(v: Option<i128>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

/// Header row, then one row per institution. Absent values are empty fields.
pub fn write_csv<W: Write>(table: &CombinedTable, out: W, dest: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(table.column_names())?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(1 + row.years.len() * 5);
        record.push(row.institution.clone());
        for values in &row.years {
            record.extend(values.fields().into_iter().map(cell));
        }
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|source| PipelineError::Io {
        path: dest.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_table;
    use crate::merge::{CombinedRow, YearValues};

    #[test]
    fn absent_values_are_empty_fields() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        write_csv(&sample_table(), &mut buf, Path::new("mem.csv"))?;
        let text = String::from_utf8(buf)?;
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Institution,Total_2020 / 2021,Men_2020 / 2021,Women_2020 / 2021,Canadian_2020 / 2021,International_2020 / 2021"
        );
        assert_eq!(lines[1], "\"A, University of\",1234,500,734,,");
        // inconsistent sources surface as negative women counts
        assert_eq!(lines[2], "B,10,12,-2,3,7");
        assert_eq!(lines.len(), 3);
        Ok(())
    }

    #[test]
    fn counts_beyond_i64_are_written_exactly() -> anyhow::Result<()> {
        let table = CombinedTable {
            years: vec!["2020 / 2021".into()],
            rows: vec![CombinedRow {
                institution: "Big".into(),
                years: vec![YearValues::new(Some(u64::MAX), Some(5), None)],
            }],
        };
        let mut buf = Vec::new();
        write_csv(&table, &mut buf, Path::new("mem.csv"))?;
        let text = String::from_utf8(buf)?;
        assert_eq!(
            text.lines().nth(1),
            Some("Big,18446744073709551615,5,18446744073709551610,,")
        );
        Ok(())
    }
}
