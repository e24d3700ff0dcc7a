//! Artifact storage: resolving input datasets and registering outputs.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

mod local;

pub use local::{ArtifactManifest, LocalArtifactStore};

/// Versioned artifact storage, as seen by a pipeline step.
pub trait ArtifactStore {
    /// Local path of the file behind `identifier` (`name[:version]`).
    fn resolve(&self, identifier: &str) -> Result<PathBuf>;

    /// Record `local_path` as a new version of artifact `name`.
    fn register(
        &mut self,
        name: &str,
        artifact_type: &str,
        description: &str,
        local_path: &Path,
    ) -> Result<ArtifactId>;
}

/// Which version of an artifact an identifier asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Latest,
    Number(u32),
}

/// Parsed `name[:version]` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub version: Version,
}

impl ArtifactRef {
    /// `name`, `name:latest`, `name:v3` and `name:3` are accepted.
    /// Any other alias yields `None`.
    pub fn parse(identifier: &str) -> Option<Self> {
        let (name, version) = match identifier.rsplit_once(':') {
            None => (identifier, Version::Latest),
            Some((name, "latest")) => (name, Version::Latest),
            Some((name, tag)) => {
                let digits = tag.strip_prefix('v').unwrap_or(tag);
                (name, Version::Number(digits.parse().ok()?))
            }
        };
        if name.is_empty() {
            return None;
        }
        Some(ArtifactRef {
            name: name.to_string(),
            version,
        })
    }
}

/// Identity of a registered artifact version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactId {
    pub name: String,
    pub version: u32,
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:v{}", self.name, self.version)
    }
}
