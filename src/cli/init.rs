// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Init command - create a new atlas project

use colored::Colorize;
use miette::Result;

use super::report;
use crate::project::Project;
use crate::utils::print_success;

/// Run the init command
pub async fn run(name: Option<String>, verbose: bool) -> Result<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    println!("{}", "Initializing atlas project...".bold());
    println!();

    let (project, created) = Project::init(&cwd, name.as_deref()).map_err(report)?;

    for path in &created {
        let shown = path.strip_prefix(project.root()).unwrap_or(path);
        print_success(&format!("Created {}", shown.display()));
    }

    if verbose {
        let manifest = project.load_manifest().map_err(report)?;
        println!();
        println!("  Name: {}", manifest.name);
        println!("  Root: {}", manifest.project_root_path.display());
        println!("  atlas: {}", manifest.atlas_version);
    }

    println!();
    println!("{}", "Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to define your stages", "atlas-config.yaml".cyan());
    println!("  2. Check it with {}", "atlas validate".cyan());
    println!("  3. Run {} to execute the pipeline", "atlas run".cyan());
    println!();

    Ok(())
}
