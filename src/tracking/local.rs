use std::collections::HashMap;
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{RunHandle, RunOutcome, RunStatus, RunTracker};
use crate::error::{CleanError, Result};

const RUN_FILE: &str = "run.json";

/// Persisted state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub job_type: String,
    pub status: RunStatus,
    pub config: Map<String, Value>,
    pub used_artifacts: Vec<String>,
    pub logged_artifacts: Vec<String>,
    pub summary: Map<String, Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Run tracker writing one `<root>/<run id>/run.json` per run.
/// The file is rewritten on every update.
#[derive(Debug)]
pub struct LocalRunTracker {
    root: PathBuf,
    runs: HashMap<String, RunRecord>,
}

impl LocalRunTracker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalRunTracker {
            root: root.into(),
            runs: HashMap::new(),
        }
    }

    pub fn run_path(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id).join(RUN_FILE)
    }

    /// Read a run record back from disk.
    pub fn load(&self, run_id: &str) -> std::io::Result<RunRecord> {
        read_record(&self.run_path(run_id))
    }

    fn persist(&self, record: &RunRecord) -> Result<()> {
        let path = self.run_path(&record.id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| CleanError::tracking(format!("cannot create {}", dir.display()), e))?;
        }
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| CleanError::tracking("cannot encode run record", e.into()))?;
        fs::write(&path, json)
            .map_err(|e| CleanError::tracking(format!("cannot write {}", path.display()), e))
    }

    fn record_mut(&mut self, run: &RunHandle) -> Result<&mut RunRecord> {
        self.runs.get_mut(&run.id).ok_or_else(|| {
            CleanError::tracking(
                format!("unknown run {}", run.id),
                IoError::new(ErrorKind::NotFound, "run was not started by this tracker"),
            )
        })
    }
}

fn read_record(path: &Path) -> std::io::Result<RunRecord> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(IoError::from)
}

impl RunTracker for LocalRunTracker {
    fn start_run(&mut self, job_type: &str) -> Result<RunHandle> {
        let record = RunRecord {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.to_string(),
            status: RunStatus::Running,
            config: Map::new(),
            used_artifacts: Vec::new(),
            logged_artifacts: Vec::new(),
            summary: Map::new(),
            started_at: Utc::now(),
            finished_at: None,
        };
        self.persist(&record)?;
        let handle = RunHandle {
            id: record.id.clone(),
            job_type: record.job_type.clone(),
        };
        self.runs.insert(record.id.clone(), record);
        Ok(handle)
    }

    fn record_config(&mut self, run: &RunHandle, config: &Map<String, Value>) -> Result<()> {
        let record = self.record_mut(run)?;
        record
            .config
            .extend(config.iter().map(|(k, v)| (k.clone(), v.clone())));
        let record = record.clone();
        self.persist(&record)
    }

    fn finish_run(&mut self, run: &RunHandle, outcome: &RunOutcome) -> Result<()> {
        let record = self.record_mut(run)?;
        record.status = outcome.status;
        record.used_artifacts.extend(outcome.used_artifacts.iter().cloned());
        record.logged_artifacts.extend(outcome.logged_artifacts.iter().cloned());
        record
            .summary
            .extend(outcome.summary.iter().map(|(k, v)| (k.clone(), v.clone())));
        record.finished_at = Some(Utc::now());
        let record = record.clone();
        self.persist(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn run_lifecycle_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut tracker = LocalRunTracker::new(dir.path());

        let run = tracker.start_run("basic_cleaning").unwrap();
        let started = tracker.load(&run.id).unwrap();
        assert_eq!(started.status, RunStatus::Running);
        assert!(started.finished_at.is_none());

        let mut config = Map::new();
        config.insert("min_price".into(), json!(10.0));
        tracker.record_config(&run, &config).unwrap();

        let mut summary = Map::new();
        summary.insert("rows_written".into(), json!(3));
        tracker
            .finish_run(
                &run,
                &RunOutcome {
                    status: RunStatus::Succeeded,
                    used_artifacts: vec!["sample.csv:latest".into()],
                    logged_artifacts: vec!["clean.csv:v0".into()],
                    summary,
                },
            )
            .unwrap();

        let done = tracker.load(&run.id).unwrap();
        assert_eq!(done.job_type, "basic_cleaning");
        assert_eq!(done.status, RunStatus::Succeeded);
        assert_eq!(done.config["min_price"], 10.0);
        assert_eq!(done.used_artifacts, vec!["sample.csv:latest".to_string()]);
        assert_eq!(done.logged_artifacts, vec!["clean.csv:v0".to_string()]);
        assert_eq!(done.summary["rows_written"], 3);
        assert!(done.finished_at.is_some());
    }

    #[test]
    fn status_is_stored_in_snake_case() {
        let dir = TempDir::new().unwrap();
        let mut tracker = LocalRunTracker::new(dir.path());
        let run = tracker.start_run("basic_cleaning").unwrap();

        let raw = fs::read_to_string(tracker.run_path(&run.id)).unwrap();
        assert!(raw.contains("\"status\": \"running\""));
    }

    #[test]
    fn unknown_run_is_tracking_error() {
        let dir = TempDir::new().unwrap();
        let mut tracker = LocalRunTracker::new(dir.path());
        let stranger = RunHandle {
            id: "nope".into(),
            job_type: "basic_cleaning".into(),
        };
        let err = tracker.record_config(&stranger, &Map::new()).unwrap_err();
        assert!(matches!(err, CleanError::Tracking { .. }));
    }
}
