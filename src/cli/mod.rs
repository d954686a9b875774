// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for atlas.

pub mod graph;
pub mod init;
pub mod model;
pub mod run;
pub mod stages;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::errors::{AtlasError, RecoverySuggestion};
use crate::models::VersionBump;
use crate::pipeline::{find_config, load_pipeline, Pipeline};
use crate::project::Project;

/// Declarative stage pipelines for ML projects
#[derive(Parser, Debug)]
#[clap(
    name = "atlas",
    version,
    about = "Run declarative stage pipelines and keep versioned models",
    long_about = None,
    after_help = "Examples:\n\
        atlas init                      Initialize a new project\n\
        atlas validate                  Check atlas-config.yaml\n\
        atlas run                       Run every stage from the root\n\
        atlas run --stage train         Run a single stage\n\
        atlas model list                Show stored models\n\n\
        See 'atlas <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Pipeline config file (default: atlas-config.yaml in the project root)
    #[clap(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new atlas project
    Init {
        /// Project name (defaults to current directory name)
        name: Option<String>,
    },

    /// List the pipeline's stages
    Stages,

    /// Show a single stage
    Stage {
        /// Stage name
        name: String,
    },

    /// Run the pipeline
    Run {
        /// Run only this stage, without its next stages
        #[clap(short, long)]
        stage: Option<String>,

        /// Dry run (show what would be done)
        #[clap(long)]
        dry_run: bool,
    },

    /// Validate pipeline configuration
    Validate,

    /// Show pipeline as a graph
    Graph {
        /// Output format
        #[clap(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Model repository
    Model {
        #[clap(subcommand)]
        action: ModelAction,
    },
}

/// Model repository actions
#[derive(Subcommand, Debug, Clone)]
pub enum ModelAction {
    /// List stored models and their versions
    List,

    /// Show a stored model version
    Show {
        /// Model name
        name: String,

        /// Version (default: latest)
        #[clap(long)]
        version: Option<String>,
    },

    /// Store a model artifact as a new version
    Save {
        /// Model name
        name: String,

        /// Artifact file to store
        artifact: PathBuf,

        /// Which part of the version to bump
        #[clap(short, long, value_enum, default_value_t = VersionBump::Patch)]
        bump: VersionBump,

        /// JSON file with training parameters
        #[clap(long)]
        parameters: Option<PathBuf>,

        /// JSON file with evaluation metrics
        #[clap(long)]
        metrics: Option<PathBuf>,
    },

    /// Delete a model, or one of its versions
    Delete {
        /// Model name
        name: String,

        /// Version to delete (default: every version)
        #[clap(long)]
        version: Option<String>,

        /// Skip confirmation
        #[clap(short, long)]
        yes: bool,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Project root and config file a command works on
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: PathBuf,
}

impl Workspace {
    /// Resolve the workspace from `--config` or the current directory.
    ///
    /// With `--config` the root is the config's directory. Otherwise the
    /// closest `.atlas` project is used, falling back to the current
    /// directory. Both paths are absolute.
    pub fn resolve(config: Option<&Path>) -> miette::Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

        if let Some(config) = config {
            let config = cwd.join(config);
            let root = config
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.clone());
            return Ok(Self { root, config });
        }

        let root = Project::discover(&cwd)
            .map(|project| project.root().to_path_buf())
            .unwrap_or(cwd);
        let config = find_config(&root);

        Ok(Self { root, config })
    }

    /// Load the workspace pipeline, reporting errors with a suggestion
    pub fn load_pipeline(&self) -> miette::Result<Pipeline> {
        load_pipeline(&self.config).map_err(report)
    }

    /// Open the `.atlas` project of this workspace
    pub fn project(&self) -> miette::Result<Project> {
        Project::discover(&self.root).map_err(report)
    }
}

/// Print the recovery suggestion for an error and hand it to miette
pub fn report(error: AtlasError) -> miette::Report {
    if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
        eprintln!("{}", suggestion.to_string().yellow());
    }
    miette::Report::new(error)
}
