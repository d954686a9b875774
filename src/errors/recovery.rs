// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use super::{AtlasError, ConfigValidationError, PipelineError};

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for an error, if there is a useful one
    pub fn for_error(error: &AtlasError) -> Option<Self> {
        match error {
            AtlasError::Config(ConfigValidationError::MissingRoot)
            | AtlasError::Pipeline(PipelineError::NoRootStage) => Some(Self::add_root_stage()),
            AtlasError::Config(ConfigValidationError::MultipleRoots { stages }) => {
                Some(Self::keep_single_root(stages))
            }
            AtlasError::Config(ConfigValidationError::Unparseable { .. }) => {
                Some(Self::fix_yaml_syntax())
            }
            AtlasError::Pipeline(PipelineError::CircularDependency { stages }) => {
                Some(Self::fix_circular_dependency(stages))
            }
            AtlasError::Pipeline(PipelineError::UnknownStage { stage, next }) => {
                Some(Self::declare_stage(stage, next))
            }
            AtlasError::Pipeline(PipelineError::StageFailed { stage, .. }) => {
                Some(Self::rerun_stage(stage))
            }
            AtlasError::ConfigNotFound { .. } | AtlasError::ProjectNotFound { .. } => {
                Some(Self::init_project())
            }
            _ => None,
        }
    }

    /// Suggest marking a root stage
    pub fn add_root_stage() -> Self {
        Self {
            action: "Mark a root stage".into(),
            steps: vec![
                "The pipeline has no entry point".into(),
                "Add 'root: true' to the stage that should run first".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest removing extra root flags
    pub fn keep_single_root(stages: &[String]) -> Self {
        Self {
            action: "Keep a single root stage".into(),
            steps: vec![
                format!("Stages flagged as root: {}", stages.join(", ")),
                "Remove 'root: true' from all but the entry stage".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing a circular dependency
    pub fn fix_circular_dependency(stages: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Detected cycle: {}", stages.join(" → ")),
                "Review the 'next_stages' lists of these stages".into(),
            ],
            commands: vec![
                "# Visualize your pipeline:".into(),
                "atlas graph --format mermaid".into(),
            ],
        }
    }

    /// Suggest declaring a referenced stage
    pub fn declare_stage(stage: &str, next: &str) -> Self {
        Self {
            action: format!("Declare stage '{}'", next),
            steps: vec![
                format!("'{}' lists '{}' in its next_stages", stage, next),
                format!("Add '{}' under pipeline.stages or fix the name", next),
            ],
            commands: vec!["atlas stages".into()],
        }
    }

    /// Suggest re-running a failed stage on its own
    pub fn rerun_stage(stage: &str) -> Self {
        Self {
            action: format!("Fix and re-run '{}'", stage),
            steps: vec![
                "Stages that ran before the failure kept their outputs".into(),
                "Once the script is fixed, run the failed stage alone".into(),
            ],
            commands: vec![format!("atlas run --stage {}", stage)],
        }
    }

    /// Suggest creating a project
    pub fn init_project() -> Self {
        Self {
            action: "Create an atlas project".into(),
            steps: vec![
                "No atlas project was found from the current directory".into(),
                "Initialize one in your project root".into(),
            ],
            commands: vec!["atlas init".into()],
        }
    }

    /// Suggest fixing invalid YAML
    pub fn fix_yaml_syntax() -> Self {
        Self {
            action: "Fix config file syntax".into(),
            steps: vec![
                "Check for common YAML issues:".into(),
                "  • Incorrect indentation (use spaces, not tabs)".into(),
                "  • Missing colons after keys".into(),
                "  • Incorrect list formatting in next_stages".into(),
            ],
            commands: vec!["atlas validate".into()],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
