//! Run configuration for one cleaning step.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::filter::{GeoBounds, NumericRange};

/// Immutable parameters of a cleaning run. Recorded on the run as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningConfig {
    /// Source dataset, `name[:version]`.
    pub input_artifact: String,
    /// Name of the produced artifact; also the file name written locally.
    pub output_artifact: String,
    pub output_type: String,
    pub output_description: String,
    pub min_price: f64,
    pub max_price: f64,
    pub geo_bounds: GeoBounds,
    pub output_dir: PathBuf,
}

impl CleaningConfig {
    /// Config with the default bounding box, writing into the working directory.
    pub fn new(
        input_artifact: impl Into<String>,
        output_artifact: impl Into<String>,
        output_type: impl Into<String>,
        output_description: impl Into<String>,
        min_price: f64,
        max_price: f64,
    ) -> Self {
        CleaningConfig {
            input_artifact: input_artifact.into(),
            output_artifact: output_artifact.into(),
            output_type: output_type.into(),
            output_description: output_description.into(),
            min_price,
            max_price,
            geo_bounds: GeoBounds::default(),
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_geo_bounds(mut self, geo_bounds: GeoBounds) -> Self {
        self.geo_bounds = geo_bounds;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn price_range(&self) -> NumericRange {
        NumericRange::new(self.min_price, self.max_price)
    }

    /// Where the cleaned CSV lands before registration.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_artifact)
    }

    /// Flat key/value view handed to the run tracker.
    pub fn to_config_map(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "config serialized to {other}, not an object"
            ))),
        }
    }
}
