use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

use super::model::{Dataset, FieldValue};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

pub const DATE_ONLY: &str = "%Y-%m-%d";
pub const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Outcome of normalizing the `last_review` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateStats {
    pub parsed: usize,
    /// Empty cells plus unparseable ones.
    pub missing: usize,
    pub unparseable: usize,
}

/// Parse a date-like string. RFC 3339 offsets are folded into UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Convert every `last_review` cell to [`FieldValue::Date`], or to
/// [`FieldValue::Missing`] when it is empty or cannot be parsed.
pub fn normalize_dates(dataset: &mut Dataset) -> DateStats {
    let col = dataset.key_columns.last_review;
    let mut stats = DateStats::default();

    for record in &mut dataset.records {
        let field = &mut record.fields[col];
        let raw = match field {
            FieldValue::Text(raw) | FieldValue::Number { raw, .. } => raw.as_str(),
            FieldValue::Date(_) => {
                stats.parsed += 1;
                continue;
            }
            FieldValue::Missing => {
                stats.missing += 1;
                continue;
            }
        };
        let normalized = match parse_date(raw) {
            Some(dt) => {
                stats.parsed += 1;
                FieldValue::Date(dt)
            }
            None => {
                if !raw.trim().is_empty() {
                    debug!("Unparseable last_review '{raw}', marking missing");
                    stats.unparseable += 1;
                }
                stats.missing += 1;
                FieldValue::Missing
            }
        };
        *field = normalized;
    }
    stats
}

/// Output format for a date column: date-only when every value sits at
/// midnight, full timestamp otherwise.
pub fn column_format(dataset: &Dataset, column: usize) -> &'static str {
    let all_midnight = dataset.records.iter().all(|r| match r.get(column) {
        FieldValue::Date(dt) => dt.time() == NaiveTime::MIN,
        _ => true,
    });
    if all_midnight {
        DATE_ONLY
    } else {
        DATE_TIME
    }
}
