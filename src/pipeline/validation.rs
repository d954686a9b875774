// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Pipeline validation
//!
//! [`ConfigValidator`] enforces the structural rules of a raw description
//! before any stage runs. [`PipelineValidator`] lints a built pipeline for
//! problems that do not block a run.

use serde_yaml::Value;
use std::path::Path;

use super::definition::{is_truthy, stage_name};
use crate::errors::ConfigValidationError;
use crate::pipeline::{Pipeline, StageGraph};

/// Structural checks on an untyped pipeline description
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a description, returning it unchanged.
    ///
    /// Structure is checked top-down and every stage must carry a `script`
    /// before root presence is decided, so each failure names exactly one
    /// defect.
    pub fn validate(description: &Value) -> Result<&Value, ConfigValidationError> {
        let top = description
            .as_mapping()
            .ok_or(ConfigValidationError::NotAMapping)?;

        let pipeline = top
            .get("pipeline")
            .ok_or(ConfigValidationError::MissingPipeline)?
            .as_mapping()
            .ok_or(ConfigValidationError::PipelineNotAMapping)?;

        let stages = pipeline
            .get("stages")
            .ok_or(ConfigValidationError::MissingStages)?
            .as_mapping()
            .ok_or(ConfigValidationError::StagesNotAMapping)?;

        let mut roots = Vec::new();

        for (key, info) in stages {
            let stage = stage_name(key).ok_or_else(|| ConfigValidationError::InvalidStageName {
                name: describe_key(key),
            })?;

            let info = info
                .as_mapping()
                .ok_or_else(|| ConfigValidationError::StageNotAMapping {
                    stage: stage.clone(),
                })?;

            let script = info
                .get("script")
                .ok_or_else(|| ConfigValidationError::MissingScript {
                    stage: stage.clone(),
                })?;

            if !script.as_str().is_some_and(|s| !s.trim().is_empty()) {
                return Err(ConfigValidationError::InvalidScript { stage });
            }

            if let Some(next) = info.get("next_stages") {
                if !is_name_list(next) {
                    return Err(ConfigValidationError::InvalidNextStages { stage });
                }
            }

            if info.get("root").is_some_and(is_truthy) {
                roots.push(stage);
            }
        }

        match roots.len() {
            0 => Err(ConfigValidationError::MissingRoot),
            1 => Ok(description),
            _ => Err(ConfigValidationError::MultipleRoots { stages: roots }),
        }
    }
}

fn is_name_list(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Sequence(items) => items.iter().all(Value::is_string),
        _ => false,
    }
}

fn describe_key(key: &Value) -> String {
    serde_yaml::to_string(key)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "?".to_string())
}

/// Lints for a built pipeline
pub struct PipelineValidator;

impl PipelineValidator {
    /// Check a pipeline for graph errors and likely mistakes
    pub fn validate(pipeline: &Pipeline, base_path: &Path) -> ValidationResult {
        let mut result = ValidationResult::new();

        if pipeline.root().is_none() {
            result.add_error("No root stage has been set");
        }

        match StageGraph::build(pipeline) {
            Ok(graph) => {
                for stage in graph.unreachable() {
                    result.add_warning(&format!(
                        "Stage '{}' is not reachable from the root and will never run",
                        stage
                    ));
                }
            }
            Err(e) => result.add_error(&e.to_string()),
        }

        for stage in pipeline.stages() {
            let mut seen = std::collections::HashSet::new();
            for next in &stage.next_stages {
                if next == &stage.name {
                    // reported as a cycle by the graph check
                    continue;
                }
                if !seen.insert(next) {
                    result.add_warning(&format!(
                        "Stage '{}' lists '{}' more than once in next_stages",
                        stage.name, next
                    ));
                }
            }
        }

        for missing in Self::validate_files(pipeline, base_path) {
            result.add_error(&missing);
        }

        result
    }

    /// Check that stage scripts exist (runtime validation)
    pub fn validate_files(pipeline: &Pipeline, base_path: &Path) -> Vec<String> {
        pipeline
            .stages()
            .into_iter()
            .filter(|stage| !base_path.join(&stage.script).is_file())
            .map(|stage| {
                format!(
                    "Stage '{}': Script not found: {}",
                    stage.name, stage.script
                )
            })
            .collect()
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
