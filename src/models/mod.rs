// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Versioned model repository
//!
//! Stores each model version under `<repository>/<model>/<version>/`: the
//! artifact in its own `artifact/` folder, optional `parameters.json` and
//! `metrics.json`, and a `metadata.json` holding the artifact checksum.

mod version;

pub use version::{ModelVersion, VersionBump};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

use crate::errors::{AtlasError, AtlasResult};

const ARTIFACT_DIRECTORY: &str = "artifact";
const METADATA_FILE: &str = "metadata.json";
const PARAMETERS_FILE: &str = "parameters.json";
const METRICS_FILE: &str = "metrics.json";

/// Stored alongside every model version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub name: String,
    pub version: String,
    /// Artifact file name inside the version's `artifact/` folder
    pub artifact: String,
    /// blake3 hash of the artifact
    pub checksum: String,
    pub saved_at: SystemTime,
}

/// A stored model version
#[derive(Debug, Clone)]
pub struct ModelRecord {
    pub name: String,
    pub version: ModelVersion,
    pub artifact_path: PathBuf,
    pub metadata: ModelMetadata,
    pub parameters: Option<serde_json::Value>,
    pub metrics: Option<serde_json::Value>,
}

/// A model and its versions, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub name: String,
    pub versions: Vec<ModelVersion>,
}

impl ModelSummary {
    pub fn latest(&self) -> Option<ModelVersion> {
        self.versions.last().copied()
    }
}

/// Filesystem model repository
#[derive(Debug, Clone)]
pub struct ModelRepository {
    path: PathBuf,
}

impl ModelRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn model_dir(&self, name: &str) -> AtlasResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(AtlasError::InvalidModelName {
                name: name.to_string(),
            });
        }
        Ok(self.path.join(name))
    }

    /// Stored versions of a model, oldest first
    pub fn versions(&self, name: &str) -> AtlasResult<Vec<ModelVersion>> {
        let dir = self.model_dir(name)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions: Vec<ModelVersion> = std::fs::read_dir(&dir)
            .map_err(|e| AtlasError::read(&dir, e))?
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        versions.sort();
        Ok(versions)
    }

    /// Every model in the repository, sorted by name
    pub fn list(&self) -> AtlasResult<Vec<ModelSummary>> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = std::fs::read_dir(&self.path)
            .map_err(|e| AtlasError::read(&self.path, e))?
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(String::from))
            .collect();
        names.sort();

        names
            .into_iter()
            .map(|name| {
                let versions = self.versions(&name)?;
                Ok(ModelSummary { name, versions })
            })
            .collect()
    }

    /// Store an artifact as the next version of a model
    pub fn save(
        &self,
        name: &str,
        artifact: &Path,
        parameters: Option<&serde_json::Value>,
        metrics: Option<&serde_json::Value>,
        bump: VersionBump,
    ) -> AtlasResult<ModelRecord> {
        let model_dir = self.model_dir(name)?;
        let bytes = std::fs::read(artifact).map_err(|e| AtlasError::read(artifact, e))?;

        std::fs::create_dir_all(&model_dir).map_err(|e| AtlasError::write(&model_dir, e))?;

        let last = self.versions(name)?.last().copied().unwrap_or_default();
        let version = last.bump(bump);
        let version_dir = model_dir.join(version.to_string());
        std::fs::create_dir(&version_dir).map_err(|e| AtlasError::write(&version_dir, e))?;

        let artifact_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "model.bin".to_string());
        let artifact_dir = version_dir.join(ARTIFACT_DIRECTORY);
        std::fs::create_dir(&artifact_dir).map_err(|e| AtlasError::write(&artifact_dir, e))?;
        let artifact_path = artifact_dir.join(&artifact_name);
        std::fs::write(&artifact_path, &bytes).map_err(|e| AtlasError::write(&artifact_path, e))?;

        for (file, info) in [(PARAMETERS_FILE, parameters), (METRICS_FILE, metrics)] {
            if let Some(info) = info {
                write_json(&version_dir.join(file), info)?;
            }
        }

        let metadata = ModelMetadata {
            name: name.to_string(),
            version: version.to_string(),
            artifact: artifact_name,
            checksum: blake3::hash(&bytes).to_hex().to_string(),
            saved_at: SystemTime::now(),
        };
        write_json(&version_dir.join(METADATA_FILE), &metadata)?;

        info!(model = name, %version, "model stored in repository");

        Ok(ModelRecord {
            name: name.to_string(),
            version,
            artifact_path,
            metadata,
            parameters: parameters.cloned(),
            metrics: metrics.cloned(),
        })
    }

    /// Load a version of a model, the latest when `version` is `None`
    pub fn load(&self, name: &str, version: Option<ModelVersion>) -> AtlasResult<ModelRecord> {
        let version = self.resolve_version(name, version)?;
        let version_dir = self.model_dir(name)?.join(version.to_string());

        let metadata: ModelMetadata = read_json(&version_dir.join(METADATA_FILE))?;
        let artifact_path = version_dir.join(ARTIFACT_DIRECTORY).join(&metadata.artifact);
        let bytes = std::fs::read(&artifact_path).map_err(|e| AtlasError::read(&artifact_path, e))?;

        if blake3::hash(&bytes).to_hex().as_str() != metadata.checksum {
            return Err(AtlasError::ChecksumMismatch {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let optional = |file: &str| -> AtlasResult<Option<serde_json::Value>> {
            let path = version_dir.join(file);
            if path.is_file() {
                read_json(&path).map(Some)
            } else {
                Ok(None)
            }
        };

        Ok(ModelRecord {
            name: name.to_string(),
            version,
            artifact_path,
            parameters: optional(PARAMETERS_FILE)?,
            metrics: optional(METRICS_FILE)?,
            metadata,
        })
    }

    /// Delete one version of a model, or the whole model when `version` is
    /// `None`
    pub fn delete(&self, name: &str, version: Option<ModelVersion>) -> AtlasResult<()> {
        let model_dir = self.model_dir(name)?;
        if !model_dir.is_dir() {
            return Err(AtlasError::ModelNotFound {
                name: name.to_string(),
            });
        }

        let target = match version {
            Some(version) => {
                let version = self.resolve_version(name, Some(version))?;
                model_dir.join(version.to_string())
            }
            None => model_dir.clone(),
        };
        std::fs::remove_dir_all(&target).map_err(|e| AtlasError::write(&target, e))?;

        if version.is_some() && self.versions(name)?.is_empty() {
            std::fs::remove_dir_all(&model_dir).map_err(|e| AtlasError::write(&model_dir, e))?;
        }

        info!(model = name, "model deleted from repository");
        Ok(())
    }

    fn resolve_version(&self, name: &str, version: Option<ModelVersion>) -> AtlasResult<ModelVersion> {
        let versions = self.versions(name)?;
        if versions.is_empty() {
            return Err(AtlasError::ModelNotFound {
                name: name.to_string(),
            });
        }

        match version {
            None => Ok(versions[versions.len() - 1]),
            Some(v) if versions.contains(&v) => Ok(v),
            Some(v) => Err(AtlasError::ModelVersionNotFound {
                name: name.to_string(),
                version: v.to_string(),
            }),
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> AtlasResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(|e| AtlasError::write(path, e))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AtlasResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| AtlasError::read(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
