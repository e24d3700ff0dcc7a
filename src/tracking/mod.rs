//! Run tracking: one tracked run per process, recorded for reproducibility.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::artifact::ArtifactId;
use crate::config::CleaningConfig;
use crate::error::{CleanError, Result};

mod local;

pub use local::{LocalRunTracker, RunRecord};

/// Experiment-tracking backend.
pub trait RunTracker {
    fn start_run(&mut self, job_type: &str) -> Result<RunHandle>;

    fn record_config(&mut self, run: &RunHandle, config: &Map<String, Value>) -> Result<()>;

    /// Close the run. Called exactly once per started run by [`RunContext`].
    fn finish_run(&mut self, run: &RunHandle, outcome: &RunOutcome) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub id: String,
    pub job_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

/// What a run did, handed to the tracker when it closes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub used_artifacts: Vec<String>,
    pub logged_artifacts: Vec<String>,
    pub summary: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// RunContext – the active run, closed on drop
// ---------------------------------------------------------------------------

/// The single active run of this process.
///
/// Dropping it without calling [`RunContext::finish`] closes the run as
/// [`RunStatus::Failed`], so every early return still finalizes the record.
pub struct RunContext<'t> {
    tracker: &'t mut dyn RunTracker,
    handle: RunHandle,
    used_artifacts: Vec<String>,
    logged_artifacts: Vec<String>,
    summary: Map<String, Value>,
    closed: bool,
}

impl<'t> RunContext<'t> {
    pub fn start(tracker: &'t mut dyn RunTracker, job_type: &str) -> Result<Self> {
        let handle = tracker.start_run(job_type)?;
        info!("Started run {} ({job_type})", handle.id);
        Ok(RunContext {
            tracker,
            handle,
            used_artifacts: Vec::new(),
            logged_artifacts: Vec::new(),
            summary: Map::new(),
            closed: false,
        })
    }

    pub fn handle(&self) -> &RunHandle {
        &self.handle
    }

    pub fn record_config(&mut self, config: &CleaningConfig) -> Result<()> {
        let map = config
            .to_config_map()
            .map_err(|e| CleanError::tracking("cannot encode run configuration", e.into()))?;
        self.tracker.record_config(&self.handle, &map)
    }

    /// Note an input artifact for lineage.
    pub fn use_artifact(&mut self, identifier: &str) {
        self.used_artifacts.push(identifier.to_string());
    }

    /// Note an artifact this run produced.
    pub fn log_artifact(&mut self, id: &ArtifactId) {
        self.logged_artifacts.push(id.to_string());
    }

    pub fn set_summary(&mut self, key: &str, value: impl Into<Value>) {
        self.summary.insert(key.to_string(), value.into());
    }

    /// Close the run as succeeded.
    pub fn finish(mut self) -> Result<()> {
        self.close(RunStatus::Succeeded)
    }

    fn close(&mut self, status: RunStatus) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let outcome = RunOutcome {
            status,
            used_artifacts: std::mem::take(&mut self.used_artifacts),
            logged_artifacts: std::mem::take(&mut self.logged_artifacts),
            summary: std::mem::take(&mut self.summary),
        };
        self.tracker.finish_run(&self.handle, &outcome)
    }
}

impl Drop for RunContext<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.close(RunStatus::Failed) {
            warn!("Could not finalize run {}: {e}", self.handle.id);
        }
    }
}
