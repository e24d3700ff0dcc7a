use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a cleaning run.
///
/// Per-row date coercions are not errors: they degrade to
/// [`FieldValue::Missing`](crate::data::model::FieldValue::Missing).
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("artifact '{identifier}' not found")]
    ArtifactNotFound {
        identifier: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<csv::Error>,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to register artifact '{name}': {reason}")]
    ArtifactRegistration {
        name: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("run tracking failed: {reason}")]
    Tracking {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl CleanError {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CleanError::Parse {
            path: path.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn registration(name: &str, reason: impl Into<String>) -> Self {
        CleanError::ArtifactRegistration {
            name: name.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn registration_io(name: &str, reason: impl Into<String>, err: std::io::Error) -> Self {
        CleanError::ArtifactRegistration {
            name: name.to_string(),
            reason: reason.into(),
            source: Some(err),
        }
    }

    pub(crate) fn tracking(reason: impl Into<String>, err: std::io::Error) -> Self {
        CleanError::Tracking {
            reason: reason.into(),
            source: Some(err),
        }
    }

    /// Process exit code for this failure. 2 is left to the argument parser.
    pub fn exit_code(&self) -> u8 {
        match self {
            CleanError::ArtifactNotFound { .. } => 3,
            CleanError::Parse { .. } => 4,
            CleanError::Write { .. } => 5,
            CleanError::ArtifactRegistration { .. } => 6,
            CleanError::Tracking { .. } => 7,
        }
    }
}

pub type Result<T> = std::result::Result<T, CleanError>;
