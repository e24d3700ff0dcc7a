use serde::Serialize;

use super::model::{Dataset, FieldValue};

// ---------------------------------------------------------------------------
// Range predicates
// ---------------------------------------------------------------------------

/// Closed interval `[min, max]`. An inverted interval contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub const fn new(min: f64, max: f64) -> Self {
        NumericRange { min, max }
    }

    /// Inclusive on both ends. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// A missing or non-numeric cell never falls inside a range.
    pub fn contains_field(&self, field: &FieldValue) -> bool {
        field.as_f64().is_some_and(|v| self.contains(v))
    }
}

pub const DEFAULT_LONGITUDE: NumericRange = NumericRange::new(-74.25, -73.50);
pub const DEFAULT_LATITUDE: NumericRange = NumericRange::new(40.5, 41.2);

/// Rectangle in longitude/latitude space that listings must fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    pub longitude: NumericRange,
    pub latitude: NumericRange,
}

impl Default for GeoBounds {
    /// New York City metro area.
    fn default() -> Self {
        GeoBounds {
            longitude: DEFAULT_LONGITUDE,
            latitude: DEFAULT_LATITUDE,
        }
    }
}

// ---------------------------------------------------------------------------
// Row filters
// ---------------------------------------------------------------------------

/// Drop records whose price falls outside `range`. Returns the drop count.
pub fn filter_price(dataset: &mut Dataset, range: NumericRange) -> usize {
    let col = dataset.key_columns.price;
    dataset.retain(|r| range.contains_field(r.get(col)))
}

/// Drop records outside the bounding box. Returns the drop count.
pub fn filter_geo(dataset: &mut Dataset, bounds: GeoBounds) -> usize {
    let lon = dataset.key_columns.longitude;
    let lat = dataset.key_columns.latitude;
    dataset.retain(|r| {
        bounds.longitude.contains_field(r.get(lon)) && bounds.latitude.contains_field(r.get(lat))
    })
}
