use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ArtifactId, ArtifactRef, ArtifactStore, Version};
use crate::error::{CleanError, Result};

const MANIFEST: &str = "manifest.json";

/// Metadata stored next to each artifact version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub name: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    pub file_name: String,
    pub sha256: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Directory-backed artifact store.
///
/// Layout: `<root>/<name>/v<N>/{<file>, manifest.json}`. A version exists
/// once its manifest is written.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.root.join(name).join(format!("v{version}"))
    }

    /// Committed versions of `name`, ascending.
    pub fn versions(&self, name: &str) -> Vec<u32> {
        let Ok(entries) = fs::read_dir(self.root.join(name)) else {
            return Vec::new();
        };
        let mut versions: Vec<u32> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let version = e.file_name().to_str()?.strip_prefix('v')?.parse().ok()?;
                e.path().join(MANIFEST).is_file().then_some(version)
            })
            .collect();
        versions.sort_unstable();
        versions
    }

    pub fn manifest(&self, name: &str, version: u32) -> std::io::Result<ArtifactManifest> {
        let text = fs::read_to_string(self.version_dir(name, version).join(MANIFEST))?;
        serde_json::from_str(&text).map_err(std::io::Error::from)
    }

    fn latest_manifest(&self, name: &str) -> std::io::Result<Option<ArtifactManifest>> {
        match self.versions(name).last() {
            Some(&v) => self.manifest(name, v).map(Some),
            None => Ok(None),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | ':'));
    if bad {
        return Err(CleanError::registration(name, "invalid artifact name"));
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

impl ArtifactStore for LocalArtifactStore {
    fn resolve(&self, identifier: &str) -> Result<PathBuf> {
        let not_found = |source| CleanError::ArtifactNotFound {
            identifier: identifier.to_string(),
            source,
        };

        let reference = ArtifactRef::parse(identifier).ok_or_else(|| not_found(None))?;
        if validate_name(&reference.name).is_err() {
            return Err(not_found(None));
        }
        let version = match reference.version {
            Version::Number(v) => v,
            Version::Latest => self
                .versions(&reference.name)
                .last()
                .copied()
                .ok_or_else(|| not_found(None))?,
        };

        let manifest = self
            .manifest(&reference.name, version)
            .map_err(|e| not_found(Some(e)))?;
        let path = self
            .version_dir(&reference.name, version)
            .join(&manifest.file_name);
        if !path.is_file() {
            return Err(not_found(None));
        }
        debug!("Resolved {identifier} to {}", path.display());
        Ok(path)
    }

    fn register(
        &mut self,
        name: &str,
        artifact_type: &str,
        description: &str,
        local_path: &Path,
    ) -> Result<ArtifactId> {
        validate_name(name)?;
        if artifact_type.trim().is_empty() {
            return Err(CleanError::registration(name, "artifact type is empty"));
        }

        let bytes = fs::read(local_path).map_err(|e| {
            CleanError::registration_io(name, format!("cannot read {}", local_path.display()), e)
        })?;
        let file_name = local_path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| CleanError::registration(name, "content path has no file name"))?
            .to_string();
        let sha256 = sha256_hex(&bytes);

        let latest = self
            .latest_manifest(name)
            .map_err(|e| CleanError::registration_io(name, "cannot read existing manifest", e))?;
        if let Some(latest) = &latest {
            if latest.artifact_type != artifact_type {
                return Err(CleanError::registration(
                    name,
                    format!(
                        "already registered with type '{}', not '{artifact_type}'",
                        latest.artifact_type
                    ),
                ));
            }
            if latest.sha256 == sha256 {
                info!("Content of {name} unchanged, keeping v{}", latest.version);
                return Ok(ArtifactId {
                    name: name.to_string(),
                    version: latest.version,
                });
            }
        }

        let version = latest.map_or(0, |m| m.version + 1);
        let dir = self.version_dir(name, version);
        fs::create_dir_all(self.root.join(name))
            .map_err(|e| CleanError::registration_io(name, "cannot create artifact directory", e))?;
        fs::create_dir(&dir).map_err(|e| {
            let reason = if e.kind() == ErrorKind::AlreadyExists {
                format!("version v{version} already exists")
            } else {
                "cannot create version directory".to_string()
            };
            CleanError::registration_io(name, reason, e)
        })?;

        fs::write(dir.join(&file_name), &bytes)
            .map_err(|e| CleanError::registration_io(name, "cannot store content", e))?;

        let manifest = ArtifactManifest {
            name: name.to_string(),
            version,
            artifact_type: artifact_type.to_string(),
            description: description.to_string(),
            file_name,
            sha256,
            size: bytes.len() as u64,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| CleanError::registration_io(name, "cannot encode manifest", e.into()))?;
        fs::write(dir.join(MANIFEST), json)
            .map_err(|e| CleanError::registration_io(name, "cannot write manifest", e))?;

        let id = ArtifactId {
            name: name.to_string(),
            version,
        };
        info!("Registered artifact {id} ({} bytes)", manifest.size);
        Ok(id)
    }
}
