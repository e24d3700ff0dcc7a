use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use basic_cleaning::artifact::{ArtifactId, ArtifactStore, LocalArtifactStore};
use basic_cleaning::cleaner::{clean, JOB_TYPE};
use basic_cleaning::tracking::{LocalRunTracker, RunContext, RunStatus};
use basic_cleaning::{CleanError, CleaningConfig};
use tempfile::{tempdir, TempDir};

const RAW: &str = "\
id,name,host_name,price,minimum_nights,last_review,reviews_per_month,longitude,latitude
2539,Clean & quiet apt,John,5,1,2018-10-19,0.21,-73.97237,40.64749
2595,Skylit Midtown Castle,Jennifer,50,1,2019-05-21,0.38,-73.98377,40.75362
3647,THE VILLAGE OF HARLEM,Elisabeth,150,3,,,-73.94190,40.80902
3831,Cozy Entire Floor,LisaRoxanne,200,1,2019-07-05,4.64,-73.95976,40.68514
5022,Entire Apt: Spacious,Laura,1000,10,2018-11-19,0.10,-73.94399,40.79851
5099,Large Cozy 1 BR,Chris,120,3,2019-06-22,0.59,-74.30000,40.74767
5121,BlissArtsSpace!,Garon,60,45,2017-10-05,0.40,-73.50000,41.20000
";

struct Workspace {
    _dir: TempDir,
    store_root: PathBuf,
    run_root: PathBuf,
    out_dir: PathBuf,
}

impl Workspace {
    fn new() -> Result<Self> {
        let dir = tempdir()?;
        let out_dir = dir.path().join("out");
        fs::create_dir_all(&out_dir)?;
        Ok(Workspace {
            store_root: dir.path().join("artifacts"),
            run_root: dir.path().join("runs"),
            out_dir,
            _dir: dir,
        })
    }

    fn seed(&self, contents: &str) -> Result<ArtifactId> {
        let staging = self.out_dir.join("sample.csv");
        fs::write(&staging, contents)?;
        let id = LocalArtifactStore::new(&self.store_root).register(
            "sample.csv",
            "raw_data",
            "raw listings",
            &staging,
        )?;
        fs::remove_file(staging)?;
        Ok(id)
    }

    fn config(&self, input: &str) -> CleaningConfig {
        CleaningConfig::new(
            input,
            "clean_sample.csv",
            "clean_sample",
            "Data with outliers removed",
            50.0,
            200.0,
        )
        .with_output_dir(&self.out_dir)
    }
}

fn run_once(ws: &Workspace, config: &CleaningConfig) -> (Result<ArtifactId, CleanError>, String) {
    let mut store = LocalArtifactStore::new(&ws.store_root);
    let mut tracker = LocalRunTracker::new(&ws.run_root);
    let run_id;
    let result = {
        let mut run = RunContext::start(&mut tracker, JOB_TYPE).unwrap();
        run_id = run.handle().id.clone();
        run.record_config(config).unwrap();
        match clean(config, &mut store, &mut run) {
            Ok(report) => {
                run.finish().unwrap();
                Ok(report.artifact)
            }
            Err(e) => Err(e),
        }
    };
    (result, run_id)
}

fn column(text: &str, name: &str) -> Vec<String> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let idx = reader
        .headers()
        .unwrap()
        .iter()
        .position(|h| h == name)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap()[idx].to_string())
        .collect()
}

#[test]
fn cleans_and_registers_output() -> Result<()> {
    let ws = Workspace::new()?;
    ws.seed(RAW)?;
    let config = ws.config("sample.csv:latest");

    let (result, run_id) = run_once(&ws, &config);
    let artifact = result?;
    assert_eq!(artifact.to_string(), "clean_sample.csv:v0");

    let text = fs::read_to_string(config.output_path())?;
    assert_eq!(text.lines().next(), RAW.lines().next());
    assert_eq!(column(&text, "price"), ["50", "150", "200", "60"]);
    assert_eq!(column(&text, "last_review"), ["2019-05-21", "", "2019-07-05", "2017-10-05"]);
    assert_eq!(column(&text, "name")[0], "Skylit Midtown Castle");

    let store = LocalArtifactStore::new(&ws.store_root);
    let manifest = store.manifest("clean_sample.csv", 0)?;
    assert_eq!(manifest.artifact_type, "clean_sample");
    assert_eq!(manifest.description, "Data with outliers removed");
    assert_eq!(fs::read_to_string(store.resolve("clean_sample.csv")?)?, text);

    let record = LocalRunTracker::new(&ws.run_root).load(&run_id)?;
    assert_eq!(record.job_type, "basic_cleaning");
    assert_eq!(record.status, RunStatus::Succeeded);
    assert_eq!(record.config["min_price"], 50.0);
    assert_eq!(record.config["output_description"], "Data with outliers removed");
    assert_eq!(record.used_artifacts, ["sample.csv:latest"]);
    assert_eq!(record.logged_artifacts, ["clean_sample.csv:v0"]);
    assert_eq!(record.summary["rows_read"], 7);
    assert_eq!(record.summary["dropped_by_price"], 2);
    assert_eq!(record.summary["dropped_by_geo"], 1);
    assert_eq!(record.summary["rows_written"], 4);
    Ok(())
}

#[test]
fn output_bounds_hold_for_every_row() -> Result<()> {
    let ws = Workspace::new()?;
    ws.seed(RAW)?;
    let config = ws.config("sample.csv");
    run_once(&ws, &config).0?;

    let text = fs::read_to_string(config.output_path())?;
    let parse = |name| -> Vec<f64> {
        column(&text, name)
            .iter()
            .map(|v| v.parse().unwrap())
            .collect()
    };
    assert!(parse("price").iter().all(|p| (50.0..=200.0).contains(p)));
    assert!(parse("longitude").iter().all(|v| (-74.25..=-73.50).contains(v)));
    assert!(parse("latitude").iter().all(|v| (40.5..=41.2).contains(v)));
    Ok(())
}

#[test]
fn rerun_is_byte_identical_and_keeps_version() -> Result<()> {
    let ws = Workspace::new()?;
    ws.seed(RAW)?;
    let config = ws.config("sample.csv:v0");

    let first_id = run_once(&ws, &config).0?;
    let first = fs::read(config.output_path())?;
    let second_id = run_once(&ws, &config).0?;
    let second = fs::read(config.output_path())?;

    assert_eq!(first, second);
    assert_eq!(first_id, second_id);
    Ok(())
}

#[test]
fn missing_input_aborts_without_output() -> Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("nonexistent.csv:latest");

    let (result, run_id) = run_once(&ws, &config);
    let err = result.unwrap_err();
    assert!(matches!(err, CleanError::ArtifactNotFound { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(!config.output_path().exists());

    let record = LocalRunTracker::new(&ws.run_root).load(&run_id)?;
    assert_eq!(record.status, RunStatus::Failed);
    assert!(record.logged_artifacts.is_empty());
    Ok(())
}

#[test]
fn missing_column_is_parse_error() -> Result<()> {
    let ws = Workspace::new()?;
    ws.seed("id,price,last_review,longitude\n1,100,,-73.9\n")?;
    let config = ws.config("sample.csv");

    let err = run_once(&ws, &config).0.unwrap_err();
    assert!(matches!(err, CleanError::Parse { .. }));
    assert!(!config.output_path().exists());
    Ok(())
}

#[test]
fn type_conflict_is_registration_error() -> Result<()> {
    let ws = Workspace::new()?;
    ws.seed(RAW)?;
    let mut config = ws.config("sample.csv");
    config.output_artifact = "sample.csv".into();

    let err = run_once(&ws, &config).0.unwrap_err();
    assert!(matches!(err, CleanError::ArtifactRegistration { .. }));
    Ok(())
}

// ---------------------------------------------------------------------------
// The cleaner only sees the trait: an in-memory store is enough.
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryStore {
    inputs: HashMap<String, PathBuf>,
    registered: Vec<(String, String, String, String)>,
}

impl ArtifactStore for MemoryStore {
    fn resolve(&self, identifier: &str) -> basic_cleaning::error::Result<PathBuf> {
        self.inputs
            .get(identifier)
            .cloned()
            .ok_or_else(|| CleanError::ArtifactNotFound {
                identifier: identifier.to_string(),
                source: None,
            })
    }

    fn register(
        &mut self,
        name: &str,
        artifact_type: &str,
        description: &str,
        local_path: &Path,
    ) -> basic_cleaning::error::Result<ArtifactId> {
        let contents = fs::read_to_string(local_path).map_err(|e| CleanError::ArtifactRegistration {
            name: name.to_string(),
            reason: "unreadable".into(),
            source: Some(e),
        })?;
        self.registered.push((
            name.to_string(),
            artifact_type.to_string(),
            description.to_string(),
            contents,
        ));
        Ok(ArtifactId {
            name: name.to_string(),
            version: self.registered.len() as u32 - 1,
        })
    }
}

#[test]
fn works_against_in_memory_store() -> Result<()> {
    let ws = Workspace::new()?;
    let input = ws.out_dir.join("raw.csv");
    fs::write(&input, RAW)?;

    let mut store = MemoryStore::default();
    store.inputs.insert("raw".into(), input);
    let config = ws.config("raw");

    let mut tracker = LocalRunTracker::new(&ws.run_root);
    let mut run = RunContext::start(&mut tracker, JOB_TYPE)?;
    let report = clean(&config, &mut store, &mut run)?;
    run.finish()?;

    assert_eq!(report.stats.rows_written, 4);
    let (name, kind, description, contents) = &store.registered[0];
    assert_eq!(name, "clean_sample.csv");
    assert_eq!(kind, "clean_sample");
    assert_eq!(description, "Data with outliers removed");
    assert_eq!(column(contents, "price"), ["50", "150", "200", "60"]);
    Ok(())
}

// ---------------------------------------------------------------------------
// Binary surface
// ---------------------------------------------------------------------------

fn cli(ws: &Workspace, input: &str) -> Command {
    cli_writing_to(ws, input, &ws.out_dir)
}

fn cli_writing_to(ws: &Workspace, input: &str, output_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_basic-cleaning"));
    cmd.env_remove("CLEANING_ARTIFACT_ROOT")
        .env_remove("CLEANING_RUN_ROOT")
        .args(["--input_artifact", input])
        .args(["--output_artifact", "clean_sample.csv"])
        .args(["--output_type", "clean_sample"])
        .args(["--output_description", "Data with outliers removed"])
        .args(["--min_price", "50", "--max_price", "200"])
        .arg("--artifact_root")
        .arg(&ws.store_root)
        .arg("--run_root")
        .arg(&ws.run_root)
        .arg("--output_dir")
        .arg(output_dir);
    cmd
}

#[test]
fn binary_exits_zero_on_success() -> Result<()> {
    let ws = Workspace::new()?;
    ws.seed(RAW)?;
    let status = cli(&ws, "sample.csv:latest").status()?;
    assert!(status.success());
    assert!(ws.out_dir.join("clean_sample.csv").is_file());
    Ok(())
}

#[test]
fn binary_reports_missing_artifact() -> Result<()> {
    let ws = Workspace::new()?;
    let status = cli(&ws, "nonexistent.csv:latest").status()?;
    assert_eq!(status.code(), Some(3));
    assert!(!ws.out_dir.join("clean_sample.csv").exists());
    Ok(())
}

#[test]
fn binary_reports_unwritable_output_dir() -> Result<()> {
    let ws = Workspace::new()?;
    ws.seed(RAW)?;
    let missing = ws.out_dir.join("not-created");
    let status = cli_writing_to(&ws, "sample.csv:latest", &missing).status()?;
    assert_eq!(status.code(), Some(5));
    assert!(!missing.exists());
    assert!(LocalArtifactStore::new(&ws.store_root)
        .versions("clean_sample.csv")
        .is_empty());
    Ok(())
}

#[test]
fn binary_rejects_missing_flags() -> Result<()> {
    let status = Command::new(env!("CARGO_BIN_EXE_basic-cleaning"))
        .args(["--input_artifact", "sample.csv"])
        .status()?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}
