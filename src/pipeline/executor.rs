// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Pipeline executor
//!
//! Runs stages breadth-first from the root, executing each reachable stage
//! at most once per run and stopping at the first failure.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::pipeline::{Pipeline, Stage};
use crate::runners::StageRunner;

/// Pipeline execution options
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Only show what would be done
    pub dry_run: bool,
    /// Print a progress line per stage
    pub show_progress: bool,
}

/// Lifecycle of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

/// Outcome of one executed stage
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: String,
    pub duration: Duration,
    /// Set for dry runs, where the script was not invoked
    pub skipped: bool,
}

/// Result of a successful pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// Stages in the order they ran
    pub outcomes: Vec<StageOutcome>,
    /// Total execution time
    pub duration: Duration,
    pub state: RunState,
}

impl RunReport {
    /// Names of the stages that ran, in order
    pub fn executed(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.stage.as_str()).collect()
    }
}

/// Breadth-first walk over a pipeline.
///
/// Owns everything scoped to one run: the FIFO queue and the set of stages
/// already enqueued. The pipeline itself is never mutated, so the same
/// pipeline can be walked again.
pub struct Traversal<'p> {
    pipeline: &'p Pipeline,
    queue: VecDeque<&'p Stage>,
    active: HashSet<&'p str>,
    state: RunState,
}

impl<'p> Traversal<'p> {
    pub fn new(pipeline: &'p Pipeline) -> Self {
        Self {
            pipeline,
            queue: VecDeque::new(),
            active: HashSet::new(),
            state: RunState::NotStarted,
        }
    }

    /// Seed the queue with the root stage
    pub fn begin(&mut self) -> Result<(), PipelineError> {
        let Some(root) = self.pipeline.root() else {
            self.transition(RunState::Failed);
            return Err(PipelineError::NoRootStage);
        };

        self.active.insert(root.name.as_str());
        self.queue.push_back(root);
        self.transition(RunState::Running);
        Ok(())
    }

    /// Next stage to execute, earliest enqueued first
    pub fn next_stage(&mut self) -> Option<&'p Stage> {
        let next = self.queue.pop_front();
        if next.is_none() && self.state == RunState::Running {
            self.transition(RunState::Succeeded);
        }
        next
    }

    /// Enqueue the successors of a stage that has finished.
    ///
    /// A terminal stage enqueues nothing; the walk continues with whatever
    /// is already queued.
    pub fn complete(&mut self, stage: &'p Stage) -> Result<(), PipelineError> {
        for next in &stage.next_stages {
            if self.active.contains(next.as_str()) {
                continue;
            }

            let Some(successor) = self.pipeline.get_stage(next) else {
                self.transition(RunState::Failed);
                return Err(PipelineError::UnknownStage {
                    stage: stage.name.clone(),
                    next: next.clone(),
                });
            };

            self.active.insert(successor.name.as_str());
            self.queue.push_back(successor);
        }

        Ok(())
    }

    /// Mark the walk as failed
    pub fn fail(&mut self) {
        self.transition(RunState::Failed);
    }

    fn transition(&mut self, state: RunState) {
        debug!(from = ?self.state, to = ?state, "run state changed");
        self.state = state;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether a stage has been enqueued during this walk
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }
}

/// Pipeline executor
pub struct PipelineExecutor {
    runner: Arc<dyn StageRunner>,
}

impl PipelineExecutor {
    /// Create an executor around a stage runner
    pub fn new(runner: impl StageRunner + 'static) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    /// Create an executor sharing an existing runner
    pub fn with_runner(runner: Arc<dyn StageRunner>) -> Self {
        Self { runner }
    }

    /// Execute a single stage
    pub async fn run_stage(&self, stage: &Stage) -> Result<StageOutcome, PipelineError> {
        let start = Instant::now();
        debug!(stage = %stage.name, script = %stage.script, "running stage");

        self.runner
            .run(&stage.script)
            .await
            .map_err(|e| PipelineError::StageFailed {
                stage: stage.name.clone(),
                message: e.to_string(),
            })?;

        let duration = start.elapsed();
        debug!(stage = %stage.name, ?duration, "stage finished");

        Ok(StageOutcome {
            stage: stage.name.clone(),
            duration,
            skipped: false,
        })
    }

    /// Execute one named stage of a pipeline, ignoring its successors
    pub async fn run_single_stage(
        &self,
        pipeline: &Pipeline,
        stage_name: &str,
    ) -> Result<StageOutcome, PipelineError> {
        let stage = pipeline.stage(stage_name)?;
        self.run_stage(stage).await
    }

    /// Execute every stage reachable from the root
    pub async fn run_pipeline(&self, pipeline: &Pipeline) -> Result<RunReport, PipelineError> {
        self.execute(pipeline, &ExecutionOptions::default()).await
    }

    /// Execute a pipeline with options
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        options: &ExecutionOptions,
    ) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let mut traversal = Traversal::new(pipeline);
        traversal.begin()?;

        let mut outcomes = Vec::new();

        while let Some(stage) = traversal.next_stage() {
            let outcome = if options.dry_run {
                if options.show_progress {
                    println!("  {} {} ({})", "○".dimmed(), stage.name.bold(), stage.script.dimmed());
                }
                StageOutcome {
                    stage: stage.name.clone(),
                    duration: Duration::ZERO,
                    skipped: true,
                }
            } else {
                if options.show_progress {
                    println!("  {} {} ({})", "→".blue(), stage.name.bold(), stage.script.dimmed());
                }

                match self.run_stage(stage).await {
                    Ok(outcome) => {
                        if options.show_progress {
                            println!(
                                "  {} {} ({:.2}s)",
                                "✓".green(),
                                stage.name.bold(),
                                outcome.duration.as_secs_f64()
                            );
                        }
                        outcome
                    }
                    Err(e) => {
                        traversal.fail();
                        if options.show_progress {
                            println!("  {} {} failed", "✗".red(), stage.name.bold());
                        }
                        return Err(e);
                    }
                }
            };

            outcomes.push(outcome);
            traversal.complete(stage)?;
        }

        let duration = start.elapsed();
        info!(stages = outcomes.len(), ?duration, "pipeline run finished");

        Ok(RunReport {
            outcomes,
            duration,
            state: traversal.state(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::ExecutionError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every script it is asked to run; fails on request
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    impl RecordingRunner {
        fn failing(scripts: &[&str]) -> Self {
            Self {
                calls: Mutex::default(),
                failing: scripts.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StageRunner for RecordingRunner {
        async fn run(&self, script: &str) -> Result<(), ExecutionError> {
            self.calls.lock().unwrap().push(script.to_string());
            if self.failing.iter().any(|s| s == script) {
                return Err(ExecutionError::NonZeroExit {
                    code: 1,
                    stderr: "boom".into(),
                });
            }
            Ok(())
        }
    }

    fn make_pipeline(root: Option<&str>, stages: &[(&str, &[&str])]) -> Pipeline {
        let mut pipeline = Pipeline::new();
        for (name, next) in stages {
            pipeline.add_stage(Stage {
                name: name.to_string(),
                script: name.to_string(),
                next_stages: next.iter().map(|s| s.to_string()).collect(),
                is_root: Some(*name) == root,
            });
        }
        pipeline
    }

    async fn run_recorded(
        runner: RecordingRunner,
        pipeline: &Pipeline,
    ) -> (Result<RunReport, PipelineError>, Vec<String>) {
        let runner = Arc::new(runner);
        let executor = PipelineExecutor::with_runner(runner.clone());
        let result = executor.run_pipeline(pipeline).await;
        (result, runner.calls())
    }

    #[tokio::test]
    async fn test_diamond_runs_each_stage_once() {
        let pipeline = make_pipeline(
            Some("A"),
            &[("A", &["B", "C"]), ("B", &["D"]), ("C", &["D"]), ("D", &[])],
        );

        let (result, calls) = run_recorded(RecordingRunner::default(), &pipeline).await;
        let report = result.unwrap();

        assert_eq!(calls, vec!["A", "B", "C", "D"]);
        assert_eq!(report.executed(), vec!["A", "B", "C", "D"]);
        assert_eq!(report.state, RunState::Succeeded);
    }

    #[tokio::test]
    async fn test_terminal_stage_does_not_stop_siblings() {
        let pipeline = make_pipeline(
            Some("A"),
            &[("A", &["B", "C"]), ("B", &[]), ("C", &["E"]), ("E", &[])],
        );

        let (result, calls) = run_recorded(RecordingRunner::default(), &pipeline).await;

        assert!(result.is_ok());
        assert_eq!(calls, vec!["A", "B", "C", "E"]);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let pipeline = make_pipeline(
            Some("A"),
            &[
                ("A", &["B", "C"]),
                ("B", &["D"]),
                ("C", &["E"]),
                ("D", &[]),
                ("E", &[]),
            ],
        );

        let (_, calls) = run_recorded(RecordingRunner::default(), &pipeline).await;
        assert_eq!(calls, vec!["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn test_unreachable_stage_never_runs() {
        let pipeline = make_pipeline(Some("A"), &[("A", &["B"]), ("B", &[]), ("Z", &[])]);

        let (_, calls) = run_recorded(RecordingRunner::default(), &pipeline).await;
        assert_eq!(calls, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_failure_stops_the_run() {
        let pipeline = make_pipeline(Some("A"), &[("A", &["B", "C"]), ("B", &[]), ("C", &[])]);

        let (result, calls) = run_recorded(RecordingRunner::failing(&["B"]), &pipeline).await;

        assert_eq!(calls, vec!["A", "B"]);
        match result {
            Err(PipelineError::StageFailed { stage, message }) => {
                assert_eq!(stage, "B");
                assert!(message.contains("boom"));
            }
            other => panic!("expected stage failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_root_runs_nothing() {
        let pipeline = make_pipeline(None, &[("A", &[])]);

        let (result, calls) = run_recorded(RecordingRunner::default(), &pipeline).await;

        assert_eq!(result.unwrap_err(), PipelineError::NoRootStage);
        assert_eq!(
            PipelineError::NoRootStage.to_string(),
            "no root stage has been set"
        );
        assert!(calls.is_empty());
    }

    #[tokio::test]
    async fn test_dangling_reference_fails_when_enqueued() {
        let pipeline = make_pipeline(Some("A"), &[("A", &["B", "ghost"]), ("B", &[])]);

        let (result, calls) = run_recorded(RecordingRunner::default(), &pipeline).await;

        // A ran; the lookup fails before B is ever dequeued
        assert_eq!(calls, vec!["A"]);
        assert_eq!(
            result.unwrap_err(),
            PipelineError::UnknownStage {
                stage: "A".into(),
                next: "ghost".into()
            }
        );
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let pipeline = make_pipeline(Some("A"), &[("A", &["B"]), ("B", &["A", "C"]), ("C", &[])]);

        let (result, calls) = run_recorded(RecordingRunner::default(), &pipeline).await;

        assert!(result.is_ok());
        assert_eq!(calls, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_pipeline_can_be_rerun() {
        let pipeline = make_pipeline(Some("A"), &[("A", &["B"]), ("B", &[])]);
        let runner = Arc::new(RecordingRunner::default());
        let executor = PipelineExecutor::with_runner(runner.clone());

        executor.run_pipeline(&pipeline).await.unwrap();
        executor.run_pipeline(&pipeline).await.unwrap();

        assert_eq!(runner.calls(), vec!["A", "B", "A", "B"]);
    }

    #[tokio::test]
    async fn test_dry_run_executes_nothing() {
        let pipeline = make_pipeline(Some("A"), &[("A", &["B"]), ("B", &[])]);
        let runner = Arc::new(RecordingRunner::default());
        let executor = PipelineExecutor::with_runner(runner.clone());

        let options = ExecutionOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = executor.execute(&pipeline, &options).await.unwrap();

        assert!(runner.calls().is_empty());
        assert_eq!(report.executed(), vec!["A", "B"]);
        assert!(report.outcomes.iter().all(|o| o.skipped));
    }

    #[tokio::test]
    async fn test_run_single_stage() {
        let pipeline = make_pipeline(Some("A"), &[("A", &["B"]), ("B", &[])]);
        let runner = Arc::new(RecordingRunner::default());
        let executor = PipelineExecutor::with_runner(runner.clone());

        let outcome = executor.run_single_stage(&pipeline, "B").await.unwrap();
        assert_eq!(outcome.stage, "B");
        assert_eq!(runner.calls(), vec!["B"]);

        let missing = executor.run_single_stage(&pipeline, "nope").await;
        assert_eq!(
            missing.unwrap_err(),
            PipelineError::StageNotFound {
                stage: "nope".into()
            }
        );
    }

    #[test]
    fn test_traversal_state_machine() {
        let pipeline = make_pipeline(Some("A"), &[("A", &[])]);
        let mut traversal = Traversal::new(&pipeline);
        assert_eq!(traversal.state(), RunState::NotStarted);

        traversal.begin().unwrap();
        assert_eq!(traversal.state(), RunState::Running);
        assert!(traversal.is_active("A"));

        let stage = traversal.next_stage().unwrap();
        traversal.complete(stage).unwrap();
        assert!(traversal.next_stage().is_none());
        assert_eq!(traversal.state(), RunState::Succeeded);

        let empty = Pipeline::new();
        let mut traversal = Traversal::new(&empty);
        assert!(traversal.begin().is_err());
        assert_eq!(traversal.state(), RunState::Failed);
    }

    #[test]
    fn test_execution_order_matches_run() {
        let pipeline = make_pipeline(
            Some("A"),
            &[("A", &["C", "B"]), ("B", &["D"]), ("C", &["D"]), ("D", &[])],
        );
        assert_eq!(pipeline.execution_order().unwrap(), vec!["A", "C", "B", "D"]);
    }
}
