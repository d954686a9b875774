// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Script runner
//!
//! Launches stage scripts as child processes. The interpreter is picked from
//! the script's extension; scripts without a known extension are executed
//! directly and must be executable.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::{ExecutionError, StageRunner};
use crate::pipeline::{Pipeline, RunnerConfig};

/// Interpreters used when the config does not override them
const DEFAULT_INTERPRETERS: [(&str, &str); 6] = [
    ("py", "python3"),
    ("sh", "sh"),
    ("bash", "bash"),
    ("R", "Rscript"),
    ("rb", "ruby"),
    ("js", "node"),
];

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 10;

/// Process-based stage runner
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    /// Directory scripts are resolved against and run in
    working_dir: PathBuf,
    /// Program (with optional leading arguments) per extension
    interpreters: HashMap<String, String>,
    /// Extra environment for every script
    env: HashMap<String, String>,
    /// Print captured stdout after a successful run
    echo_output: bool,
}

impl ScriptRunner {
    /// Create a runner rooted at a project directory.
    ///
    /// A relative directory is taken from the current directory, so scripts
    /// and the child's working directory never resolve against each other.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: absolute(working_dir.into()),
            interpreters: DEFAULT_INTERPRETERS
                .iter()
                .map(|(ext, program)| (ext.to_string(), program.to_string()))
                .collect(),
            env: HashMap::new(),
            echo_output: false,
        }
    }

    /// Create a runner with the settings from a pipeline's `runner` section
    pub fn from_config(working_dir: impl Into<PathBuf>, config: &RunnerConfig) -> Self {
        let mut runner = Self::new(working_dir);
        runner
            .interpreters
            .extend(config.interpreters.iter().map(|(k, v)| (k.clone(), v.clone())));
        runner
            .env
            .extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        runner
    }

    pub fn with_echo_output(mut self, echo_output: bool) -> Self {
        self.echo_output = echo_output;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Absolute location of a script reference
    pub fn resolve(&self, script: &str) -> PathBuf {
        let path = Path::new(script);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Interpreter command line for a script, `None` to execute it directly
    pub fn interpreter_for(&self, script: &Path) -> Option<Vec<String>> {
        let ext = script.extension()?.to_str()?;
        let command = self.interpreters.get(ext)?;
        let parts: Vec<String> = command.split_whitespace().map(String::from).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    }

    fn command_for(&self, script: &Path) -> (String, Command) {
        let mut cmd;
        let program;

        match self.interpreter_for(script) {
            Some(parts) => {
                program = parts[0].clone();
                cmd = Command::new(&parts[0]);
                cmd.args(&parts[1..]).arg(script);
            }
            None => {
                program = script.display().to_string();
                cmd = Command::new(script);
            }
        }

        cmd.current_dir(&self.working_dir)
            .env("ATLAS_PROJECT_ROOT", &self.working_dir)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        (program, cmd)
    }

    /// Interpreters needed by a pipeline's scripts that are not on `PATH`
    pub fn missing_interpreters(&self, pipeline: &Pipeline) -> Vec<String> {
        let programs: BTreeSet<String> = pipeline
            .stages()
            .into_iter()
            .filter_map(|stage| self.interpreter_for(Path::new(&stage.script)))
            .filter_map(|parts| parts.into_iter().next())
            .collect();

        programs
            .into_iter()
            .filter(|program| which::which(program).is_err())
            .collect()
    }
}

#[async_trait]
impl StageRunner for ScriptRunner {
    async fn run(&self, script: &str) -> Result<(), ExecutionError> {
        let path = self.resolve(script);
        if !path.is_file() {
            return Err(ExecutionError::ScriptNotFound { path });
        }

        let (program, mut cmd) = self.command_for(&path);
        debug!(%program, script = %path.display(), "launching stage script");

        let start = Instant::now();
        let output = cmd.output().await.map_err(|e| ExecutionError::Spawn {
            program: program.clone(),
            error: e.to_string(),
        })?;
        debug!(status = ?output.status, elapsed = ?start.elapsed(), "stage script exited");

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES);

        if output.status.success() {
            if self.echo_output && !stdout.trim().is_empty() {
                print!("{}", stdout);
                if !stdout.ends_with('\n') {
                    println!();
                }
            }
            return Ok(());
        }

        match output.status.code() {
            Some(code) => Err(ExecutionError::NonZeroExit { code, stderr }),
            None => Err(ExecutionError::Terminated { stderr }),
        }
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
