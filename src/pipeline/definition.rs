// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Pipeline definition structures
//!
//! Typed view of `atlas-config.yaml` and the in-memory stage graph built
//! from it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;

use crate::errors::{AtlasError, ConfigValidationError, PipelineError};

/// One entry under `pipeline.stages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageInfo {
    /// Script handed to the stage runner
    pub script: String,

    /// Stages that become eligible once this one succeeds
    #[serde(
        default,
        deserialize_with = "nullable_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub next_stages: Vec<String>,

    /// Entry point flag
    #[serde(default, deserialize_with = "truthy", skip_serializing_if = "is_false")]
    pub root: bool,
}

/// Settings for the process runner, read from the optional `runner` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Program used per script extension, e.g. `py: python3 -u`
    #[serde(default)]
    pub interpreters: HashMap<String, String>,

    /// Extra environment for every stage script
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Stage entries in declaration order, plus runner settings
#[derive(Debug, Clone, Default)]
pub struct PipelineDefinition {
    pub stages: Vec<(String, StageInfo)>,
    pub runner: RunnerConfig,
}

impl PipelineDefinition {
    /// Extract the typed definition from a validated description
    pub fn from_description(description: &Value) -> Result<Self, AtlasError> {
        let pipeline = description
            .get("pipeline")
            .ok_or(ConfigValidationError::MissingPipeline)?;
        let stages = pipeline
            .get("stages")
            .ok_or(ConfigValidationError::MissingStages)?
            .as_mapping()
            .ok_or(ConfigValidationError::StagesNotAMapping)?;

        let mut definition = Self::default();

        for (key, info) in stages {
            let name = stage_name(key).ok_or_else(|| ConfigValidationError::InvalidStageName {
                name: format!("{:?}", key),
            })?;
            let info: StageInfo = serde_yaml::from_value(info.clone())?;
            definition.stages.push((name, info));
        }

        if let Some(runner) = description.get("runner") {
            if !runner.is_null() {
                definition.runner = serde_yaml::from_value(runner.clone())?;
            }
        }

        Ok(definition)
    }
}

/// A unit of work in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Unique stage name
    pub name: String,
    /// Script reference passed to the runner
    pub script: String,
    /// Successor stage names, in declaration order
    pub next_stages: Vec<String>,
    /// Whether this stage is the pipeline entry point
    pub is_root: bool,
}

impl Stage {
    pub fn new(name: impl Into<String>, info: StageInfo) -> Self {
        Self {
            name: name.into(),
            script: info.script,
            next_stages: info.next_stages,
            is_root: info.root,
        }
    }

    /// A terminal stage has no successors
    pub fn is_terminal(&self) -> bool {
        self.next_stages.is_empty()
    }
}

/// The stage graph and its designated root
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: HashMap<String, Stage>,
    root: Option<String>,
    runner: RunnerConfig,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from a definition.
    ///
    /// Never fails. When several entries are flagged root the last one
    /// processed wins; the validator rejects such descriptions before they
    /// get here.
    pub fn from_definition(definition: PipelineDefinition) -> Self {
        let mut pipeline = Self {
            runner: definition.runner,
            ..Self::default()
        };

        for (name, info) in definition.stages {
            pipeline.add_stage(Stage::new(name, info));
        }

        pipeline
    }

    /// Insert or replace a stage, tracking the root flag
    pub fn add_stage(&mut self, stage: Stage) {
        if stage.is_root {
            self.root = Some(stage.name.clone());
        } else if self.root.as_deref() == Some(stage.name.as_str()) {
            self.root = None;
        }
        self.stages.insert(stage.name.clone(), stage);
    }

    /// The entry stage, if one was declared
    pub fn root(&self) -> Option<&Stage> {
        self.root.as_deref().and_then(|name| self.stages.get(name))
    }

    /// Get a stage by name
    pub fn get_stage(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    /// Look up a stage, failing with a pipeline error
    pub fn stage(&self, name: &str) -> Result<&Stage, PipelineError> {
        self.get_stage(name).ok_or_else(|| PipelineError::StageNotFound {
            stage: name.to_string(),
        })
    }

    /// All stages, sorted by name
    pub fn stages(&self) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self.stages.values().collect();
        stages.sort_by(|a, b| a.name.cmp(&b.name));
        stages
    }

    /// All stage names, sorted
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages().into_iter().map(|s| s.name.as_str()).collect()
    }

    /// Stages that list `name` among their successors, sorted by name
    pub fn predecessors(&self, name: &str) -> Vec<&Stage> {
        self.stages()
            .into_iter()
            .filter(|s| s.next_stages.iter().any(|n| n == name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn runner_config(&self) -> &RunnerConfig {
        &self.runner
    }

    /// Stage names in the order a full run would execute them
    pub fn execution_order(&self) -> Result<Vec<String>, PipelineError> {
        let mut traversal = super::Traversal::new(self);
        traversal.begin()?;

        let mut order = Vec::new();
        while let Some(stage) = traversal.next_stage() {
            order.push(stage.name.clone());
            traversal.complete(stage)?;
        }

        Ok(order)
    }
}

/// YAML truthiness of a `root` flag
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Stage names are mapping keys; scalar keys are accepted as text
pub(crate) fn stage_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|v| is_truthy(&v))
}

fn nullable_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn is_false(b: &bool) -> bool {
    !*b
}
