// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Validate command - check pipeline configuration

use colored::Colorize;
use miette::Result;

use super::{report, Workspace};
use crate::pipeline::{load_pipeline, PipelineValidator};
use crate::utils::{print_error, print_section, print_success, print_warning};

/// Run the validate command
pub async fn run(workspace: &Workspace, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let pipeline = match load_pipeline(&workspace.config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            print_error(&e.to_string());
            println!();
            return Err(report(e));
        }
    };

    print_success(&format!("{} is well formed", workspace.config.display()));

    let validation = PipelineValidator::validate(&pipeline, &workspace.root);

    if !validation.errors.is_empty() {
        print_section("Errors");
        for error in &validation.errors {
            print_error(error);
        }
    }

    if !validation.warnings.is_empty() {
        print_section("Warnings");
        for warning in &validation.warnings {
            print_warning(warning);
        }
    }

    if verbose {
        print_section("Pipeline summary");
        if let Some(root) = pipeline.root() {
            println!("  Root: {}", root.name);
        }
        println!("  Stages: {}", pipeline.len());
        for stage in pipeline.stages() {
            let next = if stage.is_terminal() {
                String::new()
            } else {
                format!(" [next: {}]", stage.next_stages.join(", "))
            };
            println!("    - {} ({}){}", stage.name, stage.script, next.dimmed());
        }
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Pipeline validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }
    Ok(())
}
