// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake worker launcher for testing

use super::{LaunchError, WorkerLauncher};
use async_trait::async_trait;
use kiln_core::{BuildOutput, BuildWork, ExitStatus, Repository, TerminationError};
use std::sync::{Arc, Mutex};

/// Recorded launcher invocation
#[derive(Debug, Clone)]
pub struct LaunchCall {
    pub repo: Repository,
    pub work: BuildWork,
}

/// Fake worker launcher for testing
#[derive(Clone, Default)]
pub struct FakeLauncher {
    calls: Arc<Mutex<Vec<LaunchCall>>>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    status: i32,
    fatal: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdout(mut self, bytes: &[u8]) -> Self {
        self.stdout = bytes.to_vec();
        self
    }

    pub fn with_stderr(mut self, bytes: &[u8]) -> Self {
        self.stderr = bytes.to_vec();
        self
    }

    pub fn with_status(mut self, status: ExitStatus) -> Self {
        self.status = status.0;
        self
    }

    /// Make every launch fail with the fatal host defect.
    pub fn with_fatal_termination(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<LaunchCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl WorkerLauncher for FakeLauncher {
    async fn run(
        &self,
        repo: &Repository,
        work: &BuildWork,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<ExitStatus, LaunchError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(LaunchCall {
                repo: repo.clone(),
                work: work.clone(),
            });

        if self.fatal {
            return Err(TerminationError.into());
        }

        out.write_all(&self.stdout).await?;
        err.write_all(&self.stderr).await?;
        Ok(ExitStatus(self.status))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
