// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Model command - manage the model repository

use colored::Colorize;
use miette::Result;
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use super::{report, ModelAction, Workspace};
use crate::errors::{AtlasError, AtlasResult};
use crate::models::ModelVersion;

/// Run the model command
pub async fn run(workspace: &Workspace, action: ModelAction, _verbose: bool) -> Result<()> {
    let project = workspace.project()?;
    let repository = project.model_repository();

    match action {
        ModelAction::List => {
            let models = repository.list().map_err(report)?;

            println!("{}", "Stored Models".bold());
            println!("{}", "═".repeat(40));

            if models.is_empty() {
                println!("{}", "  No models stored yet.".dimmed());
                println!();
                println!("{}", "  Save one with 'atlas model save <NAME> <FILE>'.".dimmed());
                return Ok(());
            }

            for model in models {
                let versions: Vec<String> = model.versions.iter().map(|v| v.to_string()).collect();
                println!("  {} ({})", model.name.bold(), versions.join(", "));
            }

            Ok(())
        }

        ModelAction::Show { name, version } => {
            let version = parse_version(version.as_deref()).map_err(report)?;
            let record = repository.load(&name, version).map_err(report)?;

            println!("{} {}", record.name.bold(), record.version.to_string().cyan());
            println!("  Artifact: {}", record.artifact_path.display());
            println!("  Checksum: {}", record.metadata.checksum.dimmed());
            if let Ok(age) = SystemTime::now().duration_since(record.metadata.saved_at) {
                println!("  Saved:    {} ago", format_duration(age));
            }

            for (title, info) in [("Parameters", &record.parameters), ("Metrics", &record.metrics)] {
                if let Some(info) = info {
                    let pretty = serde_json::to_string_pretty(info).map_err(AtlasError::from)?;
                    println!();
                    println!("{}:", title.bold());
                    for line in pretty.lines() {
                        println!("  {}", line);
                    }
                }
            }

            Ok(())
        }

        ModelAction::Save {
            name,
            artifact,
            bump,
            parameters,
            metrics,
        } => {
            let parameters = parameters.as_deref().map(read_json).transpose().map_err(report)?;
            let metrics = metrics.as_deref().map(read_json).transpose().map_err(report)?;

            let record = repository
                .save(&name, &artifact, parameters.as_ref(), metrics.as_ref(), bump)
                .map_err(report)?;

            println!(
                "  {} Saved {} {}",
                "✓".green(),
                record.name.bold(),
                record.version.to_string().cyan()
            );

            Ok(())
        }

        ModelAction::Delete { name, version, yes } => {
            let version = parse_version(version.as_deref()).map_err(report)?;
            let target = match version {
                Some(version) => format!("{} {}", name, version),
                None => format!("every version of {}", name),
            };

            if !yes {
                print!("Delete {}? [y/N] ", target);
                io::stdout().flush().ok();

                let mut input = String::new();
                io::stdin().read_line(&mut input).ok();

                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("{}", "Cancelled.".dimmed());
                    return Ok(());
                }
            }

            repository.delete(&name, version).map_err(report)?;
            println!("{}", format!("Deleted {}.", target).green());

            Ok(())
        }
    }
}

fn parse_version(version: Option<&str>) -> AtlasResult<Option<ModelVersion>> {
    version.map(str::parse).transpose()
}

fn read_json(path: &Path) -> AtlasResult<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| AtlasError::read(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
        assert_eq!(format_duration(Duration::from_secs(3 * 86400)), "3d");
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version(None).unwrap(), None);
        assert_eq!(
            parse_version(Some("1.0.2")).unwrap(),
            Some(ModelVersion::new(1, 0, 2))
        );
        assert!(parse_version(Some("latest")).is_err());
    }
}
