// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! # atlas - declarative stage pipelines
//!
//! `atlas` runs pipelines of script stages described in a config file.
//! Stages run breadth-first from a single root, each at most once per run,
//! and the run stops at the first failing stage.
//!
//! ## Features
//!
//! - **Config validation** - Precise messages for malformed descriptions
//! - **Graph checks** - Dangling references and cycles rejected up front
//! - **Script runner** - Stages are scripts launched with an interpreter by extension
//! - **Model repository** - Versioned artifacts with parameters and metrics
//!
//! ## Quick Start
//!
//! ```bash
//! # Initialize a new project
//! atlas init my-project
//!
//! # Check the pipeline
//! atlas validate
//!
//! # Run pipeline
//! atlas run
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! # async fn demo() -> atlas::AtlasResult<()> {
//! use atlas::{load_pipeline, PipelineExecutor, ScriptRunner};
//!
//! let pipeline = load_pipeline("atlas-config.yaml".as_ref())?;
//! let executor = PipelineExecutor::new(ScriptRunner::new("."));
//! executor.run_pipeline(&pipeline).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod project;
pub mod runners;
pub mod utils;

// Re-export commonly used types
pub use errors::{AtlasError, AtlasResult, ConfigValidationError, PipelineError};
pub use models::{ModelRepository, ModelVersion};
pub use pipeline::{build_pipeline, load_pipeline, Pipeline, PipelineExecutor, Stage};
pub use project::Project;
pub use runners::{ScriptRunner, StageRunner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
