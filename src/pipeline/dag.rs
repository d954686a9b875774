// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Stage graph checks and rendering
//!
//! Builds a petgraph view of a pipeline so that dangling `next_stages`
//! references and cycles are caught at build time instead of mid-run.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::PipelineError;
use crate::pipeline::Pipeline;

/// Checked, acyclic view of a pipeline's stages
pub struct StageGraph {
    graph: DiGraph<String, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    root: Option<NodeIndex>,
}

impl StageGraph {
    /// Build the graph, rejecting unknown successors and cycles
    pub fn build(pipeline: &Pipeline) -> Result<Self, PipelineError> {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();

        for stage in pipeline.stages() {
            let node = graph.add_node(stage.name.clone());
            name_to_index.insert(stage.name.clone(), node);
        }

        for stage in pipeline.stages() {
            let from = name_to_index[&stage.name];

            for next in &stage.next_stages {
                let to = *name_to_index
                    .get(next)
                    .ok_or_else(|| PipelineError::UnknownStage {
                        stage: stage.name.clone(),
                        next: next.clone(),
                    })?;

                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let root = pipeline.root().map(|stage| name_to_index[&stage.name]);

        let dag = Self {
            graph,
            name_to_index,
            root,
        };
        dag.validate_acyclic()?;

        Ok(dag)
    }

    fn validate_acyclic(&self) -> Result<(), PipelineError> {
        toposort(&self.graph, None)
            .map(|_| ())
            .map_err(|cycle| PipelineError::CircularDependency {
                stages: self.cycle_through(cycle.node_id()),
            })
    }

    /// Shortest cycle through `start`, as names ending where they began
    fn cycle_through(&self, start: NodeIndex) -> Vec<String> {
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if next == start {
                    let mut path = vec![node];
                    let mut current = node;
                    while let Some(&p) = parent.get(&current) {
                        path.push(p);
                        current = p;
                    }
                    path.reverse();

                    let mut names: Vec<String> =
                        path.into_iter().map(|n| self.graph[n].clone()).collect();
                    names.push(self.graph[start].clone());
                    return names;
                }

                if seen.insert(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        vec![self.graph[start].clone()]
    }

    /// Name of the root stage, if any
    pub fn root(&self) -> Option<&str> {
        self.root.map(|n| self.graph[n].as_str())
    }

    /// Stages that list `stage_name` as a successor, sorted
    pub fn predecessors(&self, stage_name: &str) -> Option<Vec<String>> {
        self.neighbors(stage_name, Direction::Incoming)
    }

    /// Stages listed as successors of `stage_name`, sorted
    pub fn successors(&self, stage_name: &str) -> Option<Vec<String>> {
        self.neighbors(stage_name, Direction::Outgoing)
    }

    fn neighbors(&self, stage_name: &str, direction: Direction) -> Option<Vec<String>> {
        let node = self.name_to_index.get(stage_name)?;
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        Some(names)
    }

    /// Stages a full run can reach
    pub fn reachable(&self) -> HashSet<String> {
        let mut reached = HashSet::new();
        let Some(root) = self.root else {
            return reached;
        };

        let mut bfs = Bfs::new(&self.graph, root);
        while let Some(node) = bfs.next(&self.graph) {
            reached.insert(self.graph[node].clone());
        }
        reached
    }

    /// Stages a full run never reaches, sorted
    pub fn unreachable(&self) -> Vec<String> {
        let reached = self.reachable();
        let mut names: Vec<String> = self
            .name_to_index
            .keys()
            .filter(|name| !reached.contains(*name))
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn sorted_nodes(&self) -> Vec<(&str, NodeIndex)> {
        let mut nodes: Vec<(&str, NodeIndex)> = self
            .name_to_index
            .iter()
            .map(|(name, node)| (name.as_str(), *node))
            .collect();
        nodes.sort();
        nodes
    }

    fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.edge_indices().filter_map(move |edge| {
            let (from, to) = self.graph.edge_endpoints(edge)?;
            Some((self.graph[from].as_str(), self.graph[to].as_str()))
        })
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        let ids = self.mermaid_ids();

        for (name, node) in self.sorted_nodes() {
            let label = name.replace('"', "#quot;");
            if Some(node) == self.root {
                out.push_str(&format!("    {}([\"{}\"])\n", ids[&node], label));
            } else {
                out.push_str(&format!("    {}[\"{}\"]\n", ids[&node], label));
            }
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                out.push_str(&format!("    {} --> {}\n", ids[&from], ids[&to]));
            }
        }

        out
    }

    /// Mermaid node ids: the stage name reduced to `[A-Za-z0-9_]`, made
    /// unique with the node index when two names reduce to the same id
    fn mermaid_ids(&self) -> HashMap<NodeIndex, String> {
        let mut ids = HashMap::new();
        let mut used = HashSet::new();

        for (name, node) in self.sorted_nodes() {
            let mut id: String = name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
                .collect();
            // `end` is reserved in flowcharts
            if id.is_empty() || id.eq_ignore_ascii_case("end") {
                id.push('_');
            }
            if !used.insert(id.clone()) {
                id = format!("{}_{}", id, node.index());
                used.insert(id.clone());
            }
            ids.insert(node, id);
        }

        ids
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        if let Some(root) = self.root() {
            out.push_str(&format!("    \"{}\" [style=\"rounded,bold\"];\n", root));
        }

        for (from, to) in self.edges() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
        }

        for (name, node) in self.sorted_nodes() {
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", name));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self, pipeline: &Pipeline) -> Result<String, PipelineError> {
        let order = pipeline.execution_order()?;
        let mut out = String::new();

        for (i, name) in order.iter().enumerate() {
            let stage = pipeline.stage(name)?;

            out.push_str(&format!("{}. {} ({})", i + 1, stage.name, stage.script));
            if stage.is_root {
                out.push_str(" [root]");
            }
            if !stage.is_terminal() {
                out.push_str(&format!(" [next: {}]", stage.next_stages.join(", ")));
            }
            out.push('\n');
        }

        let unreachable = self.unreachable();
        if !unreachable.is_empty() {
            out.push_str(&format!("\nunreachable: {}\n", unreachable.join(", ")));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;

    fn make_test_pipeline(stages: Vec<(&str, Vec<&str>)>) -> Pipeline {
        let mut pipeline = Pipeline::new();
        for (i, (name, next)) in stages.into_iter().enumerate() {
            pipeline.add_stage(Stage {
                name: name.into(),
                script: format!("stages/{}.py", name),
                next_stages: next.into_iter().map(String::from).collect(),
                is_root: i == 0,
            });
        }
        pipeline
    }

    #[test]
    fn test_diamond_graph() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec!["b", "c"]),
            ("b", vec!["d"]),
            ("c", vec!["d"]),
            ("d", vec![]),
        ]);

        let graph = StageGraph::build(&pipeline).unwrap();
        assert_eq!(graph.root(), Some("a"));
        assert_eq!(graph.predecessors("d").unwrap(), vec!["b", "c"]);
        assert_eq!(graph.successors("a").unwrap(), vec!["b", "c"]);
        assert!(graph.unreachable().is_empty());
    }

    #[test]
    fn test_unknown_successor() {
        let pipeline = make_test_pipeline(vec![("a", vec!["ghost"])]);

        let result = StageGraph::build(&pipeline);
        assert_eq!(
            result.err(),
            Some(PipelineError::UnknownStage {
                stage: "a".into(),
                next: "ghost".into()
            })
        );
    }

    #[test]
    fn test_circular_dependency_detection() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec!["b"]),
            ("b", vec!["c"]),
            ("c", vec!["b"]),
        ]);

        match StageGraph::build(&pipeline) {
            Err(PipelineError::CircularDependency { stages }) => {
                assert_eq!(stages.len(), 3);
                assert_eq!(stages.first(), stages.last());
                assert!(stages.contains(&"b".to_string()));
                assert!(stages.contains(&"c".to_string()));
            }
            other => panic!("expected cycle, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_self_loop() {
        let pipeline = make_test_pipeline(vec![("a", vec!["a"])]);

        let result = StageGraph::build(&pipeline);
        assert_eq!(
            result.err(),
            Some(PipelineError::CircularDependency {
                stages: vec!["a".into(), "a".into()]
            })
        );
    }

    #[test]
    fn test_unreachable_stages() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec!["b"]),
            ("b", vec![]),
            ("x", vec!["y"]),
            ("y", vec![]),
        ]);

        let graph = StageGraph::build(&pipeline).unwrap();
        assert_eq!(graph.unreachable(), vec!["x", "y"]);
    }

    #[test]
    fn test_mermaid_output() {
        let pipeline = make_test_pipeline(vec![("a", vec!["b"]), ("b", vec![])]);

        let graph = StageGraph::build(&pipeline).unwrap();
        let mermaid = graph.to_mermaid();

        assert!(mermaid.contains("graph TD"));
        assert!(mermaid.contains("a([\"a\"])"));
        assert!(mermaid.contains("a --> b"));
    }

    #[test]
    fn test_mermaid_escapes_stage_names() {
        let pipeline = make_test_pipeline(vec![
            ("feature eng", vec!["feature_eng", "end"]),
            ("feature_eng", vec![]),
            ("end", vec![]),
        ]);

        let graph = StageGraph::build(&pipeline).unwrap();
        let mermaid = graph.to_mermaid();

        // sorted: end (0), feature eng (1), feature_eng (2)
        assert!(mermaid.contains("    end_[\"end\"]"));
        assert!(mermaid.contains("    feature_eng([\"feature eng\"])"));
        assert!(mermaid.contains("    feature_eng_2[\"feature_eng\"]"));
        assert!(mermaid.contains("feature_eng --> feature_eng_2"));
        assert!(mermaid.contains("feature_eng --> end_"));
        assert!(!mermaid.contains("feature eng --> "));
    }

    #[test]
    fn test_dot_output_lists_isolated_nodes() {
        let pipeline = make_test_pipeline(vec![("a", vec![]), ("lonely", vec![])]);

        let graph = StageGraph::build(&pipeline).unwrap();
        let dot = graph.to_dot();

        assert!(dot.starts_with("digraph pipeline {"));
        assert!(dot.contains("\"lonely\";"));
    }

    #[test]
    fn test_text_follows_breadth_first_order() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec!["c", "b"]),
            ("b", vec!["d"]),
            ("c", vec![]),
            ("d", vec![]),
        ]);

        let graph = StageGraph::build(&pipeline).unwrap();
        let text = graph.to_text(&pipeline).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "1. a (stages/a.py) [root] [next: c, b]");
        assert_eq!(lines[1], "2. c (stages/c.py)");
        assert_eq!(lines[2], "3. b (stages/b.py) [next: d]");
        assert_eq!(lines[3], "4. d (stages/d.py)");
    }
}
