// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Stages commands - list and inspect pipeline stages

use colored::Colorize;
use miette::Result;

use super::Workspace;
use crate::utils::print_warning;

/// List the stages in the order a run executes them, then the ones a run
/// never reaches
pub async fn list(workspace: &Workspace, _verbose: bool) -> Result<()> {
    let pipeline = workspace.load_pipeline()?;
    let order = pipeline.execution_order()?;

    println!("{}", "Stages".bold());
    for (i, name) in order.iter().enumerate() {
        let stage = pipeline.stage(name)?;
        let marker = if stage.is_root {
            format!(" {}", "[root]".cyan())
        } else {
            String::new()
        };
        println!("  {}. {}{} ({})", i + 1, stage.name, marker, stage.script.dimmed());
    }

    for stage in pipeline.stages() {
        if !order.contains(&stage.name) {
            println!(
                "  -  {} {} ({})",
                stage.name,
                "[unreachable]".yellow(),
                stage.script.dimmed()
            );
        }
    }

    Ok(())
}

/// Show one stage and how it is wired into the pipeline
pub async fn show(workspace: &Workspace, name: &str, _verbose: bool) -> Result<()> {
    let pipeline = workspace.load_pipeline()?;
    let stage = pipeline.stage(name).map_err(miette::Report::new)?;

    let join = |names: Vec<&str>| {
        if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        }
    };
    let previous: Vec<&str> = pipeline
        .predecessors(name)
        .into_iter()
        .map(|s| s.name.as_str())
        .collect();
    let next: Vec<&str> = stage.next_stages.iter().map(String::as_str).collect();

    println!("{}", stage.name.bold());
    println!("  Script:   {}", stage.script);
    println!("  Root:     {}", if stage.is_root { "yes" } else { "no" });
    println!("  Previous: {}", join(previous));
    println!("  Next:     {}", join(next));

    if !workspace.root.join(&stage.script).is_file() {
        print_warning("script not found");
    }

    Ok(())
}
