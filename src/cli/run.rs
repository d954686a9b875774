// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Run command - execute the pipeline

use colored::Colorize;
use miette::Result;

use super::{report, Workspace};
use crate::errors::AtlasError;
use crate::pipeline::{ExecutionOptions, PipelineExecutor, PipelineValidator};
use crate::runners::ScriptRunner;

/// Run the pipeline, or a single stage of it
pub async fn run(
    workspace: &Workspace,
    stage: Option<String>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let pipeline = workspace.load_pipeline()?;

    let validation = PipelineValidator::validate(&pipeline, &workspace.root);
    if validation.has_warnings() && verbose {
        eprintln!("{}", "Pipeline warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    let runner = ScriptRunner::from_config(&workspace.root, pipeline.runner_config())
        .with_echo_output(true);
    if verbose {
        eprintln!("{} {}", "Project root:".dimmed(), runner.working_dir().display());
    }

    let missing = runner.missing_interpreters(&pipeline);
    if !missing.is_empty() && !dry_run {
        eprintln!("{}", "Interpreters not found on PATH:".yellow().bold());
        for program in &missing {
            eprintln!("  {} {}", "⚠".yellow(), program);
        }
        eprintln!();
    }

    let executor = PipelineExecutor::new(runner);

    if let Some(name) = stage {
        if dry_run {
            let stage = pipeline.stage(&name).map_err(miette::Report::new)?;
            println!("  {} {} ({})", "○".dimmed(), stage.name.bold(), stage.script.dimmed());
            return Ok(());
        }

        println!("{} {}", "Running stage".bold(), name.cyan());
        let outcome = executor
            .run_single_stage(&pipeline, &name)
            .await
            .map_err(|e| report(AtlasError::from(e)))?;
        println!(
            "  {} {} ({:.2}s)",
            "✓".green(),
            outcome.stage.bold(),
            outcome.duration.as_secs_f64()
        );
        return Ok(());
    }

    if dry_run {
        println!("{}", "Dry run - stages in execution order:".bold());
    } else {
        println!("{}", "Running pipeline".bold());
    }

    let options = ExecutionOptions {
        dry_run,
        show_progress: true,
    };
    let summary = executor
        .execute(&pipeline, &options)
        .await
        .map_err(|e| report(AtlasError::from(e)))?;

    println!();
    if dry_run {
        println!("{} stages would run", summary.outcomes.len());
    } else {
        println!(
            "{}",
            format!(
                "Pipeline finished: {} stages in {:.2}s",
                summary.outcomes.len(),
                summary.duration.as_secs_f64()
            )
            .green()
            .bold()
        );
    }

    Ok(())
}
