use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::dates::column_format;
use super::model::{Dataset, FieldValue};
use crate::error::{CleanError, Result};

/// Write the dataset as CSV: header row first, no index column.
/// An existing file at `path` is truncated.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let write_err = |source: std::io::Error| CleanError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    let date_format = column_format(dataset, dataset.key_columns.last_review);

    writer
        .write_record(&dataset.column_names)
        .map_err(|e| write_err(e.into()))?;

    for record in &dataset.records {
        let row = record.fields.iter().map(|field| match field {
            FieldValue::Date(dt) => dt.format(date_format).to_string(),
            other => other.to_string(),
        });
        writer.write_record(row).map_err(|e| write_err(e.into()))?;
    }

    let mut inner = writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?;
    inner.flush().map_err(write_err)?;
    Ok(())
}
