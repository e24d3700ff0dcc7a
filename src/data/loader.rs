use std::path::Path;

use log::debug;

use super::model::{Dataset, FieldValue, KeyColumns, Record};
use crate::error::{CleanError, Result};

pub const PRICE: &str = "price";
pub const LAST_REVIEW: &str = "last_review";
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Load a listings CSV.
///
/// The header row must name `price`, `last_review`, `longitude` and
/// `latitude`; every other column is carried through as text. The numeric
/// columns must be empty or parse as `f64`. Rows with a different field
/// count than the header are rejected.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| CleanError::Parse {
        path: path.to_path_buf(),
        reason: "cannot open CSV".into(),
        source: Some(e),
    })?;

    let column_names: Vec<String> = reader
        .headers()
        .map_err(|e| CleanError::Parse {
            path: path.to_path_buf(),
            reason: "cannot read header row".into(),
            source: Some(e),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if column_names.is_empty() {
        return Err(CleanError::parse(path, "file has no header row"));
    }

    let position = |name: &str| {
        column_names
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CleanError::parse(path, format!("missing required column '{name}'")))
    };
    let key_columns = KeyColumns {
        price: position(PRICE)?,
        last_review: position(LAST_REVIEW)?,
        longitude: position(LONGITUDE)?,
        latitude: position(LATITUDE)?,
    };
    let numeric = [key_columns.price, key_columns.longitude, key_columns.latitude];

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| CleanError::Parse {
            path: path.to_path_buf(),
            reason: "malformed row".into(),
            source: Some(e),
        })?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let mut fields = Vec::with_capacity(row.len());
        for (idx, raw) in row.iter().enumerate() {
            let value = if numeric.contains(&idx) {
                parse_number(raw).ok_or_else(|| {
                    CleanError::parse(
                        path,
                        format!(
                            "line {line}: column '{}' value '{raw}' is not a number",
                            column_names[idx]
                        ),
                    )
                })?
            } else if idx == key_columns.last_review && raw.trim().is_empty() {
                FieldValue::Missing
            } else {
                FieldValue::Text(raw.to_string())
            };
            fields.push(value);
        }
        records.push(Record { fields });
    }

    debug!("Loaded {} rows x {} columns from {}", records.len(), column_names.len(), path.display());

    Ok(Dataset {
        column_names,
        records,
        key_columns,
    })
}

/// Empty cells are missing; anything else must be a float.
fn parse_number(raw: &str) -> Option<FieldValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(FieldValue::Missing);
    }
    trimmed.parse::<f64>().ok().map(|value| FieldValue::Number {
        raw: raw.to_string(),
        value,
    })
}
