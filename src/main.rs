// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! atlas - declarative stage pipelines
//!
//! Run breadth-first stage pipelines described in `atlas-config.yaml`.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atlas::cli::{Cli, Commands, Workspace};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "atlas=debug" } else { "atlas=info" };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let verbose = cli.verbose;
    let workspace = || Workspace::resolve(cli.config.as_deref());

    // Dispatch to command handlers
    match cli.command {
        Commands::Init { name } => atlas::cli::init::run(name, verbose).await,
        Commands::Stages => atlas::cli::stages::list(&workspace()?, verbose).await,
        Commands::Stage { name } => atlas::cli::stages::show(&workspace()?, &name, verbose).await,
        Commands::Run { stage, dry_run } => {
            atlas::cli::run::run(&workspace()?, stage, dry_run, verbose).await
        }
        Commands::Validate => atlas::cli::validate::run(&workspace()?, verbose).await,
        Commands::Graph { format } => atlas::cli::graph::run(&workspace()?, format, verbose).await,
        Commands::Model { action } => atlas::cli::model::run(&workspace()?, action, verbose).await,
    }
}
