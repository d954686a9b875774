// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Graph command - visualize pipeline as a graph

use miette::Result;

use super::{GraphFormat, Workspace};
use crate::pipeline::StageGraph;

/// Run the graph command
pub async fn run(workspace: &Workspace, format: GraphFormat, _verbose: bool) -> Result<()> {
    let pipeline = workspace.load_pipeline()?;
    let graph = StageGraph::build(&pipeline)?;

    let output = match format {
        GraphFormat::Text => graph.to_text(&pipeline)?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    print!("{}", output);

    Ok(())
}
