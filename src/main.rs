use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use basic_cleaning::artifact::LocalArtifactStore;
use basic_cleaning::cleaner::{clean, JOB_TYPE};
use basic_cleaning::data::filter::{GeoBounds, NumericRange, DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use basic_cleaning::tracking::{LocalRunTracker, RunContext};
use basic_cleaning::{CleanError, CleaningConfig};

/// A very basic data cleaning
#[derive(Parser, Debug)]
#[command(name = "basic-cleaning", version)]
struct Cli {
    /// Name for input artifact
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// Name for output artifact
    #[arg(long = "output_artifact")]
    output_artifact: String,

    /// Type for the artifact
    #[arg(long = "output_type")]
    output_type: String,

    /// Description for the output artifact
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price
    #[arg(long = "min_price", allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum price
    #[arg(long = "max_price", allow_negative_numbers = true)]
    max_price: f64,

    /// Root directory of the local artifact store
    #[arg(long = "artifact_root", env = "CLEANING_ARTIFACT_ROOT", default_value = "artifacts")]
    artifact_root: PathBuf,

    /// Root directory of the local run tracker
    #[arg(long = "run_root", env = "CLEANING_RUN_ROOT", default_value = "runs")]
    run_root: PathBuf,

    /// Directory the cleaned CSV is written to
    #[arg(long = "output_dir", default_value = ".")]
    output_dir: PathBuf,

    #[arg(long = "min_longitude", allow_negative_numbers = true, default_value_t = DEFAULT_LONGITUDE.min)]
    min_longitude: f64,

    #[arg(long = "max_longitude", allow_negative_numbers = true, default_value_t = DEFAULT_LONGITUDE.max)]
    max_longitude: f64,

    #[arg(long = "min_latitude", allow_negative_numbers = true, default_value_t = DEFAULT_LATITUDE.min)]
    min_latitude: f64,

    #[arg(long = "max_latitude", allow_negative_numbers = true, default_value_t = DEFAULT_LATITUDE.max)]
    max_latitude: f64,
}

impl Cli {
    fn cleaning_config(&self) -> CleaningConfig {
        CleaningConfig::new(
            &self.input_artifact,
            &self.output_artifact,
            &self.output_type,
            &self.output_description,
            self.min_price,
            self.max_price,
        )
        .with_geo_bounds(GeoBounds {
            longitude: NumericRange::new(self.min_longitude, self.max_longitude),
            latitude: NumericRange::new(self.min_latitude, self.max_latitude),
        })
        .with_output_dir(&self.output_dir)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.cleaning_config();
    let mut store = LocalArtifactStore::new(&cli.artifact_root);
    let mut tracker = LocalRunTracker::new(&cli.run_root);

    let mut run = RunContext::start(&mut tracker, JOB_TYPE).context("starting run")?;
    run.record_config(&config)
        .context("recording run configuration")?;

    let report = clean(&config, &mut store, &mut run)
        .with_context(|| format!("cleaning {}", config.input_artifact))?;
    info!(
        "Wrote {} rows to {} and registered {}",
        report.stats.rows_written,
        report.output_path.display(),
        report.artifact
    );

    run.finish().context("closing run")
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let code = err
                .downcast_ref::<CleanError>()
                .map_or(1, CleanError::exit_code);
            ExitCode::from(code)
        }
    }
}
