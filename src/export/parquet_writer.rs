use arrow::{
    array::{ArrayRef, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{io::Write, sync::Arc};
use tracing::warn;

use crate::{error::Result, merge::CombinedTable};

/// Institution as non-null Utf8, every value column as nullable Int64.
/// Values outside the Int64 range are written as null with a warning.
pub fn arrow_schema(table: &CombinedTable) -> Schema {
    let fields: Vec<Field> = table
        .column_names()
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                Field::new(name, DataType::Utf8, false)
            } else {
                Field::new(name, DataType::Int64, true)
            }
        })
        .collect();
    Schema::new(fields)
}

pub fn to_record_batch(table: &CombinedTable) -> Result<RecordBatch> {
    let schema = Arc::new(arrow_schema(table));
    let width = table.years.len() * 5;

    let names = table.column_names();
    let mut columns: Vec<Vec<Option<i64>>> = vec![Vec::with_capacity(table.rows.len()); width];
    for row in &table.rows {
        for (y, values) in row.years.iter().enumerate() {
            for (f, v) in values.fields().into_iter().enumerate() {
                let col = y * 5 + f;
                let narrowed = v.and_then(|n| match i64::try_from(n) {
                    Ok(n) => Some(n),
                    Err(_) => {
                        warn!(
                            institution = %row.institution,
                            column = %names[col + 1],
                            value = %n,
                            "value does not fit Int64; written as null"
                        );
                        None
                    }
                });
                columns[col].push(narrowed);
            }
        }
    }

    let institutions: Vec<&str> = table.institutions().collect();
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(width + 1);
    arrays.push(Arc::new(StringArray::from(institutions)));
    for col in columns {
        arrays.push(Arc::new(Int64Array::from(col)));
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// One row group, Snappy compressed.
pub fn write_parquet<W: Write + Send>(table: &CombinedTable, out: W) -> Result<()> {
    let batch = to_record_batch(table)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(out, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
