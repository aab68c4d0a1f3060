// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker launchers
//!
//! A launcher runs exactly one worker per dispatched job and reports the
//! job's exit status. The subprocess and in-process variants implement the
//! identical contract so the dispatcher and tests can substitute one for the
//! other.

mod in_process;
mod subprocess;

pub use in_process::InProcessLauncher;
pub use subprocess::SubprocessLauncher;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLauncher, LaunchCall};

use async_trait::async_trait;
use kiln_core::{BuildOutput, BuildWork, ExitStatus, Repository};
use thiserror::Error;

/// Launch errors
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Host cannot decode process outcomes; takes the whole server down.
    #[error(transparent)]
    Termination(#[from] kiln_core::TerminationError),
    #[error("could not encode worker env overrides: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io error while relaying worker output: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs one worker for one job, streaming its output to the given sinks.
///
/// The returned status is what crosses the wire: a worker that ran to
/// completion reports its real exit code; one that could not start or was
/// killed reports 1. Only unrecoverable host defects surface as errors.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    async fn run(
        &self,
        repo: &Repository,
        work: &BuildWork,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<ExitStatus, LaunchError>;
}
