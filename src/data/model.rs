use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// FieldValue – a single cell
// ---------------------------------------------------------------------------

/// A cell of the listings table.
///
/// Passthrough columns stay `Text`, numeric columns keep the raw text next to
/// the parsed value so they are written back exactly as read.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number { raw: String, value: f64 },
    /// Normalized timestamp; date-only inputs land at midnight.
    Date(NaiveDateTime),
    /// Empty cell, or a date that could not be parsed.
    Missing,
}

impl FieldValue {
    /// Numeric view used by the range filters. `Missing` and text have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number { raw, .. } => write!(f, "{raw}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row
// ---------------------------------------------------------------------------

/// One listing; `fields[i]` belongs to `Dataset::column_names[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<FieldValue>,
}

impl Record {
    pub fn get(&self, column: usize) -> &FieldValue {
        &self.fields[column]
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete table
// ---------------------------------------------------------------------------

/// Column positions of the fields the cleaning rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub price: usize,
    pub last_review: usize,
    pub longitude: usize,
    pub latitude: usize,
}

/// The parsed table, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Header row, in file order.
    pub column_names: Vec<String>,
    pub records: Vec<Record>,
    pub key_columns: KeyColumns,
}

impl Dataset {
    /// Position of a column by header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep only the records matching `keep`, preserving order.
    /// Returns how many were dropped.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Record) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|r| keep(r));
        before - self.records.len()
    }
}
