// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Atlas projects
//!
//! A project is a directory holding `atlas-config.yaml` and a hidden
//! `.atlas/` folder with the project manifest and the model repository.
//! Every operation takes the project root explicitly; only
//! [`Project::discover`] looks at the filesystem to find one.

mod template;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{AtlasError, AtlasResult};
use crate::models::ModelRepository;
use crate::pipeline::{find_config, load_pipeline, Pipeline};

/// Hidden metadata directory in a project root
pub const ATLAS_HIDDEN_DIRECTORY: &str = ".atlas";
/// Manager folder inside the metadata directory
pub const MANAGER_DIRECTORY: &str = "manager";
/// Project manifest file name
pub const PROJECT_JSON: &str = "atlas_project.json";
/// Model repository folder inside the metadata directory
pub const MODEL_REPOSITORY_DIRECTORY: &str = "model_repository";

/// Contents of `.atlas/manager/atlas_project.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectManifest {
    pub name: String,
    pub project_root_path: PathBuf,
    pub atlas_version: String,
}

/// An atlas project rooted at an explicit directory
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Open the project at `root`
    pub fn open(root: impl Into<PathBuf>) -> AtlasResult<Self> {
        let root = root.into();
        if !root.join(ATLAS_HIDDEN_DIRECTORY).is_dir() {
            return Err(AtlasError::ProjectNotFound { start: root });
        }
        Ok(Self { root })
    }

    /// Find the closest project at or above `start`
    pub fn discover(start: &Path) -> AtlasResult<Self> {
        for dir in start.ancestors() {
            debug!(dir = %dir.display(), "looking for {}", ATLAS_HIDDEN_DIRECTORY);
            if dir.join(ATLAS_HIDDEN_DIRECTORY).is_dir() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
        }

        Err(AtlasError::ProjectNotFound {
            start: start.to_path_buf(),
        })
    }

    /// Scaffold a new project in `root`.
    ///
    /// Creates the metadata folders and manifest, plus a template config and
    /// stage scripts unless a config already exists. Returns the project and
    /// every path that was created.
    pub fn init(root: impl Into<PathBuf>, name: Option<&str>) -> AtlasResult<(Self, Vec<PathBuf>)> {
        let root = root.into();
        let dot_atlas = root.join(ATLAS_HIDDEN_DIRECTORY);
        if dot_atlas.exists() {
            return Err(AtlasError::ProjectExists { path: root });
        }

        let project = Self { root };
        let mut created = Vec::new();

        for dir in [
            project.dot_atlas_dir(),
            project.dot_atlas_dir().join(MANAGER_DIRECTORY),
            project.model_repository_path(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| AtlasError::write(&dir, e))?;
            created.push(dir);
        }

        let name = name.map(String::from).unwrap_or_else(|| project.default_name());
        project.save_manifest(&ProjectManifest {
            name: name.clone(),
            project_root_path: project.root.clone(),
            atlas_version: crate::VERSION.to_string(),
        })?;
        created.push(project.manifest_path());

        if !find_config(&project.root).is_file() {
            for (relative, content) in template::files(&name) {
                let path = project.root.join(relative);
                if path.exists() {
                    continue;
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| AtlasError::write(parent, e))?;
                }
                std::fs::write(&path, content).map_err(|e| AtlasError::write(&path, e))?;
                created.push(path);
            }
        }

        Ok((project, created))
    }

    fn default_name(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| "atlas-project".to_string())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dot_atlas_dir(&self) -> PathBuf {
        self.root.join(ATLAS_HIDDEN_DIRECTORY)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dot_atlas_dir().join(MANAGER_DIRECTORY).join(PROJECT_JSON)
    }

    pub fn model_repository_path(&self) -> PathBuf {
        self.dot_atlas_dir().join(MODEL_REPOSITORY_DIRECTORY)
    }

    pub fn model_repository(&self) -> ModelRepository {
        ModelRepository::new(self.model_repository_path())
    }

    /// Config file of this project (`atlas-config.yaml` unless another
    /// supported variant exists)
    pub fn config_path(&self) -> PathBuf {
        find_config(&self.root)
    }

    /// Load, validate and build this project's pipeline
    pub fn load_pipeline(&self) -> AtlasResult<Pipeline> {
        load_pipeline(&self.config_path())
    }

    /// Write the manifest into `.atlas/manager/`
    pub fn save_manifest(&self, manifest: &ProjectManifest) -> AtlasResult<()> {
        let path = self.manifest_path();
        let content = serde_json::to_string_pretty(manifest)?;

        std::fs::write(&path, content).map_err(|e| AtlasError::ManifestWrite {
            file: PROJECT_JSON.to_string(),
            help: Some(format!("{}: {}", path.display(), e)),
        })
    }

    /// Read the manifest from `.atlas/manager/`
    pub fn load_manifest(&self) -> AtlasResult<ProjectManifest> {
        let path = self.manifest_path();
        let content = std::fs::read_to_string(&path).map_err(|e| AtlasError::read(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CONFIG_FILE;

    #[test]
    fn test_init_scaffolds_project() {
        let dir = tempfile::tempdir().unwrap();
        let (project, created) = Project::init(dir.path(), Some("churn")).unwrap();

        assert!(project.dot_atlas_dir().is_dir());
        assert!(project.model_repository_path().is_dir());
        assert!(project.config_path().is_file());
        assert!(created.contains(&project.manifest_path()));

        let manifest = project.load_manifest().unwrap();
        assert_eq!(manifest.name, "churn");
        assert_eq!(manifest.project_root_path, dir.path());

        // the template is a valid pipeline
        let pipeline = project.load_pipeline().unwrap();
        assert_eq!(pipeline.root().unwrap().name, "preprocess");
        for stage in pipeline.stages() {
            assert!(dir.path().join(&stage.script).is_file());
        }
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = "pipeline:\n  stages:\n    mine: { script: mine.sh, root: true }\n";
        std::fs::write(dir.path().join(CONFIG_FILE), config).unwrap();

        Project::init(dir.path(), None).unwrap();

        let kept = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(kept, config);
        assert!(!dir.path().join("stages").exists());
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        Project::init(dir.path(), None).unwrap();

        let err = Project::init(dir.path(), None).unwrap_err();
        assert!(matches!(err, AtlasError::ProjectExists { .. }));
    }

    #[test]
    fn test_dot_atlas_folder_search() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".atlas/manager")).unwrap();
        let nested = dir.path().join("src/features");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::discover(&nested).unwrap();
        assert_eq!(project.root(), dir.path());
    }

    #[test]
    fn test_dot_atlas_folder_search_non_existent() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::open(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), ".atlas folder could not be found!");
    }

    #[test]
    fn test_save_manifest_without_manager_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".atlas")).unwrap();

        let project = Project::open(dir.path()).unwrap();
        let err = project
            .save_manifest(&ProjectManifest {
                name: "x".into(),
                project_root_path: dir.path().to_path_buf(),
                atlas_version: crate::VERSION.into(),
            })
            .unwrap_err();

        assert_eq!(err.to_string(), "Error saving information to atlas_project.json.");
    }
}
