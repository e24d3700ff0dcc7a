//! The basic cleaning step: resolve, parse, filter, normalize, write, register.

use std::path::{Path, PathBuf};

use log::info;

use crate::artifact::{ArtifactId, ArtifactStore};
use crate::config::CleaningConfig;
use crate::data::dates::{normalize_dates, DateStats};
use crate::data::filter::{filter_geo, filter_price};
use crate::data::loader::load_csv;
use crate::data::model::Dataset;
use crate::data::writer::write_csv;
use crate::error::Result;
use crate::tracking::RunContext;

/// Job type the run is registered under.
pub const JOB_TYPE: &str = "basic_cleaning";

/// Row accounting for the in-memory rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub rows_read: usize,
    pub dropped_by_price: usize,
    pub dropped_by_geo: usize,
    pub rows_written: usize,
    pub dates: DateStats,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub artifact: ArtifactId,
    pub stats: TransformStats,
}

/// Price filter, date normalization, then geo filter.
pub fn transform(dataset: &mut Dataset, config: &CleaningConfig) -> TransformStats {
    let rows_read = dataset.len();

    info!(
        "Dropping outliers outside price range [{}, {}]",
        config.min_price, config.max_price
    );
    let dropped_by_price = filter_price(dataset, config.price_range());

    info!("Converting last_review to dates");
    let dates = normalize_dates(dataset);

    info!("Dropping rows outside the longitude/latitude bounding box");
    let dropped_by_geo = filter_geo(dataset, config.geo_bounds);

    TransformStats {
        rows_read,
        dropped_by_price,
        dropped_by_geo,
        rows_written: dataset.len(),
        dates,
    }
}

/// Parse `input`, apply the cleaning rules and write the result to
/// `config.output_path()`. Touches no external service.
pub fn clean_file(input: &Path, config: &CleaningConfig) -> Result<TransformStats> {
    let mut dataset = load_csv(input)?;
    let stats = transform(&mut dataset, config);

    let output = config.output_path();
    info!("Saving cleaned dataset to {}", output.display());
    write_csv(&dataset, &output)?;
    Ok(stats)
}

/// Run the whole step against an artifact store, recording lineage and
/// row counts on `run`. Any failure aborts the remaining steps.
pub fn clean(
    config: &CleaningConfig,
    store: &mut dyn ArtifactStore,
    run: &mut RunContext<'_>,
) -> Result<CleanReport> {
    info!("Fetching input artifact {}", config.input_artifact);
    let input_path = store.resolve(&config.input_artifact)?;
    run.use_artifact(&config.input_artifact);

    let stats = clean_file(&input_path, config)?;
    info!(
        "Kept {} of {} rows ({} outside price range, {} outside bounding box, {} missing last_review)",
        stats.rows_written,
        stats.rows_read,
        stats.dropped_by_price,
        stats.dropped_by_geo,
        stats.dates.missing
    );

    let output_path = config.output_path();
    info!("Registering artifact {}", config.output_artifact);
    let artifact = store.register(
        &config.output_artifact,
        &config.output_type,
        &config.output_description,
        &output_path,
    )?;
    run.log_artifact(&artifact);

    run.set_summary("rows_read", stats.rows_read);
    run.set_summary("dropped_by_price", stats.dropped_by_price);
    run.set_summary("dropped_by_geo", stats.dropped_by_geo);
    run.set_summary("rows_written", stats.rows_written);
    run.set_summary("missing_last_review", stats.dates.missing);
    run.set_summary("unparseable_last_review", stats.dates.unparseable);

    Ok(CleanReport {
        input_path,
        output_path,
        artifact,
        stats,
    })
}
