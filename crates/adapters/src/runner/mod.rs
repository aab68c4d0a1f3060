// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution adapters

mod process;

pub use process::ProcessRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRunner, RunnerCall, ScriptedRun};

use async_trait::async_trait;
use kiln_core::{BuildOutput, Termination};
use std::path::Path;
use thiserror::Error;

/// Errors from running a subprocess
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("io error while streaming output: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Termination(#[from] kiln_core::TerminationError),
}

/// Adapter for the checkout and build subprocesses.
///
/// Every invocation writes a `Running command ...` trace line to the stdout
/// sink before executing, then streams the child's own output to the sinks
/// unmodified. `env: Some(..)` replaces the child's entire environment;
/// `None` inherits the caller's.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        cwd: &Path,
        program: &str,
        args: &[String],
        env: Option<&[(String, String)]>,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<Termination, RunnerError>;
}
