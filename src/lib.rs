//! Basic cleaning step of the listings pipeline.
//!
//! Fetches a raw listings CSV from the artifact store, drops price and
//! location outliers, normalizes `last_review` and registers the result as
//! a new artifact, all under one tracked run.

pub mod artifact;
pub mod cleaner;
pub mod config;
pub mod data;
pub mod error;
pub mod tracking;

pub use cleaner::{clean, clean_file, CleanReport};
pub use config::CleaningConfig;
pub use error::CleanError;
