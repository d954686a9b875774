// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Stage runners
//!
//! The executor only needs one capability from the outside world: run a
//! stage's script and report success or failure. [`ScriptRunner`] does
//! that by launching the script as a child process.

mod script;

pub use script::ScriptRunner;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Why a stage script did not complete successfully
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("script not found: {path}")]
    ScriptNotFound { path: PathBuf },

    #[error("failed to launch '{program}': {error}")]
    Spawn { program: String, error: String },

    #[error("script exited with code {code}{}", stderr_suffix(.stderr))]
    NonZeroExit { code: i32, stderr: String },

    #[error("script was terminated by a signal{}", stderr_suffix(.stderr))]
    Terminated { stderr: String },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Trait for stage runners
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Run the script referenced by a stage
    async fn run(&self, script: &str) -> Result<(), ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ExecutionError::NonZeroExit {
            code: 2,
            stderr: "  ValueError: bad input\n".into(),
        };
        assert_eq!(err.to_string(), "script exited with code 2: ValueError: bad input");

        let err = ExecutionError::Terminated { stderr: String::new() };
        assert_eq!(err.to_string(), "script was terminated by a signal");
    }
}
