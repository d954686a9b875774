// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Error types
//!
//! Two kinds of failure matter to a pipeline run: a config file that is
//! structurally wrong ([`ConfigValidationError`], raised before anything
//! executes) and a failure while building or traversing the stage graph
//! ([`PipelineError`]). Everything else the tool can hit is collected in
//! [`AtlasError`], which wraps both transparently.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for atlas operations
pub type AtlasResult<T> = Result<T, AtlasError>;

/// A single structural defect in a pipeline description.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Improper structure of config file")]
    #[diagnostic(
        code(atlas::config::structure),
        help("The config file must be a mapping with a top-level 'pipeline' key")
    )]
    NotAMapping,

    #[error("Failed to find 'pipeline' key in config file")]
    #[diagnostic(code(atlas::config::missing_pipeline))]
    MissingPipeline,

    #[error("Improper structure of 'pipeline' section")]
    #[diagnostic(code(atlas::config::structure))]
    PipelineNotAMapping,

    #[error("Failed to find 'stages' key in pipeline")]
    #[diagnostic(code(atlas::config::missing_stages))]
    MissingStages,

    #[error("Improper structure of 'stages' section")]
    #[diagnostic(
        code(atlas::config::structure),
        help("'stages' maps each stage name to its 'script', 'next_stages' and 'root'")
    )]
    StagesNotAMapping,

    #[error("Invalid stage name '{name}'")]
    #[diagnostic(code(atlas::config::stage_name))]
    InvalidStageName { name: String },

    #[error("Improper structure of '{stage}' stage")]
    #[diagnostic(code(atlas::config::structure))]
    StageNotAMapping { stage: String },

    #[error("Failed to find 'script' key in '{stage}' stage")]
    #[diagnostic(code(atlas::config::missing_script))]
    MissingScript { stage: String },

    #[error("'script' in '{stage}' stage must be a non-empty string")]
    #[diagnostic(code(atlas::config::invalid_script))]
    InvalidScript { stage: String },

    #[error("'next_stages' in '{stage}' stage must be a list of stage names")]
    #[diagnostic(code(atlas::config::invalid_next_stages))]
    InvalidNextStages { stage: String },

    #[error("Failed to find any root stage in config file")]
    #[diagnostic(
        code(atlas::config::missing_root),
        help("Mark the entry stage of your pipeline with 'root: true'")
    )]
    MissingRoot,

    #[error("Found multiple root stages in config file: {}", quoted(.stages))]
    #[diagnostic(
        code(atlas::config::multiple_roots),
        help("A pipeline has a single entry point; keep 'root: true' on one stage only")
    )]
    MultipleRoots { stages: Vec<String> },

    #[error("Failed to parse {path}, please check file format")]
    #[diagnostic(code(atlas::config::parse))]
    Unparseable {
        path: PathBuf,
        #[help]
        message: Option<String>,
    },
}

/// Failure while building or running a pipeline.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no root stage has been set")]
    #[diagnostic(
        code(atlas::pipeline::no_root),
        help("Mark the entry stage of your pipeline with 'root: true'")
    )]
    NoRootStage,

    #[error("Stage '{stage}' failed: {message}")]
    #[diagnostic(code(atlas::pipeline::stage_failed))]
    StageFailed { stage: String, message: String },

    #[error("Stage '{stage}' references unknown next stage '{next}'")]
    #[diagnostic(
        code(atlas::pipeline::unknown_stage),
        help("Check that '{next}' is declared under pipeline.stages")
    )]
    UnknownStage { stage: String, next: String },

    #[error("Stage '{stage}' not found in pipeline")]
    #[diagnostic(code(atlas::pipeline::stage_not_found))]
    StageNotFound { stage: String },

    #[error("Circular dependency detected: {}", .stages.join(" → "))]
    #[diagnostic(
        code(atlas::pipeline::circular_dependency),
        help("Review your 'next_stages' lists to remove the cycle")
    )]
    CircularDependency { stages: Vec<String> },
}

/// Main error type for atlas
#[derive(Error, Debug, Diagnostic)]
pub enum AtlasError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipeline(#[from] PipelineError),

    // ─────────────────────────────────────────────────────────────────────────
    // Project Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Config file not found: {path}")]
    #[diagnostic(
        code(atlas::config_not_found),
        help("Create one with 'atlas init' or write atlas-config.yaml manually")
    )]
    ConfigNotFound { path: PathBuf },

    #[error(".atlas folder could not be found!")]
    #[diagnostic(
        code(atlas::project_not_found),
        help("Run 'atlas init' in your project root, or pass it with --directory")
    )]
    ProjectNotFound { start: PathBuf },

    #[error("'{path}' is already an atlas project")]
    #[diagnostic(code(atlas::project_exists))]
    ProjectExists { path: PathBuf },

    #[error("Error saving information to {file}.")]
    #[diagnostic(code(atlas::manifest_write))]
    ManifestWrite {
        file: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Model Repository Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Model '{name}' not found in model repository")]
    #[diagnostic(code(atlas::model_not_found), help("List stored models with 'atlas model list'"))]
    ModelNotFound { name: String },

    #[error("Model '{name}' has no version {version}")]
    #[diagnostic(code(atlas::model_version_not_found))]
    ModelVersionNotFound { name: String, version: String },

    #[error("Invalid model name '{name}'")]
    #[diagnostic(
        code(atlas::invalid_model_name),
        help("Model names are a single path component, e.g. 'churn-classifier'")
    )]
    InvalidModelName { name: String },

    #[error("Invalid model version '{version}'")]
    #[diagnostic(code(atlas::invalid_model_version), help("Versions look like MAJOR.MINOR.PATCH, e.g. 1.4.0"))]
    InvalidModelVersion { version: String },

    #[error("Checksum mismatch for model '{name}' {version}")]
    #[diagnostic(
        code(atlas::checksum_mismatch),
        help("The stored artifact changed after it was saved")
    )]
    ChecksumMismatch { name: String, version: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(atlas::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(atlas::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(atlas::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(atlas::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(atlas::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(atlas::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for AtlasError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for AtlasError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for AtlasError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for AtlasError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl AtlasError {
    /// Read failure on a specific path
    pub fn read(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::FileReadError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Write failure on a specific path
    pub fn write(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::FileWriteError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// The stage a pipeline error points at, if any
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Self::Pipeline(PipelineError::StageFailed { stage, .. }) => Some(stage),
            _ => None,
        }
    }
}

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ConfigValidationError::MissingScript { stage: "stage1".into() }.to_string(),
            "Failed to find 'script' key in 'stage1' stage"
        );
        assert_eq!(
            ConfigValidationError::MultipleRoots {
                stages: vec!["a".into(), "b".into()]
            }
            .to_string(),
            "Found multiple root stages in config file: 'a', 'b'"
        );
    }

    #[test]
    fn test_transparent_wrapping() {
        let err: AtlasError = PipelineError::NoRootStage.into();
        assert_eq!(err.to_string(), "no root stage has been set");

        let err: AtlasError = PipelineError::StageFailed {
            stage: "train".into(),
            message: "exit code 1".into(),
        }
        .into();
        assert_eq!(err.failed_stage(), Some("train"));
    }
}
