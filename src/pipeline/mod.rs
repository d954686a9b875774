// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Pipeline definitions, validation and execution
//!
//! A description flows through [`ConfigValidator`], is turned into a
//! [`Pipeline`], checked as a [`StageGraph`] and finally run by the
//! [`PipelineExecutor`].

mod dag;
mod definition;
mod executor;
mod loader;
mod validation;

pub use dag::StageGraph;
pub use definition::*;
pub use executor::{
    ExecutionOptions, PipelineExecutor, RunReport, RunState, StageOutcome, Traversal,
};
pub use loader::{find_config, load_description, DescriptionFormat, CONFIG_CANDIDATES, CONFIG_FILE};
pub use validation::{ConfigValidator, PipelineValidator, ValidationResult};

use serde_yaml::Value;
use std::path::Path;
use tracing::warn;

use crate::errors::AtlasResult;

/// Validate a description and build a checked pipeline from it
pub fn build_pipeline(description: &Value) -> AtlasResult<Pipeline> {
    let validated = ConfigValidator::validate(description)?;
    let pipeline = Pipeline::from_definition(PipelineDefinition::from_description(validated)?);
    let graph = StageGraph::build(&pipeline)?;
    for stage in graph.unreachable() {
        warn!(%stage, "stage is not reachable from the root and will never run");
    }
    Ok(pipeline)
}

/// Load, validate and build the pipeline described by a config file
pub fn load_pipeline(path: &Path) -> AtlasResult<Pipeline> {
    build_pipeline(&load_description(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AtlasError, ConfigValidationError, PipelineError};

    fn build(yaml: &str) -> AtlasResult<Pipeline> {
        build_pipeline(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_build_ml_pipeline() {
        let pipeline = build(
            r#"
pipeline:
  stages:
    preprocess:
      script: stages/preprocess.py
      next_stages: [train]
      root: true
    train:
      script: stages/train.py
      next_stages: [evaluate]
    evaluate:
      script: stages/evaluate.py
"#,
        )
        .unwrap();

        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.root().unwrap().name, "preprocess");
        assert_eq!(
            pipeline.execution_order().unwrap(),
            vec!["preprocess", "train", "evaluate"]
        );
    }

    #[test]
    fn test_build_rejects_before_graph_check() {
        let err = build("pipeline:\n  stages:\n    a: { script: a.sh }\n").unwrap_err();
        assert!(matches!(
            err,
            AtlasError::Config(ConfigValidationError::MissingRoot)
        ));
    }

    #[test]
    fn test_build_rejects_dangling_reference() {
        let err = build(
            "pipeline:\n  stages:\n    a: { script: a.sh, next_stages: [b], root: true }\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AtlasError::Pipeline(PipelineError::UnknownStage { .. })
        ));
    }

    #[test]
    fn test_build_rejects_cycle() {
        let err = build(
            r#"
pipeline:
  stages:
    a: { script: a.sh, next_stages: [b], root: true }
    b: { script: b.sh, next_stages: [a] }
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AtlasError::Pipeline(PipelineError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_load_pipeline_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "pipeline:\n  stages:\n    only: { script: only.sh, root: true }\n",
        )
        .unwrap();

        let pipeline = load_pipeline(&path).unwrap();
        assert_eq!(pipeline.stage_names(), vec!["only"]);
    }
}
