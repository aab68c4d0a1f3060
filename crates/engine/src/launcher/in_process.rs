// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process worker launcher

use super::{LaunchError, WorkerLauncher};
use crate::checkout::CheckoutError;
use crate::worker::{Worker, WorkerError};
use async_trait::async_trait;
use kiln_adapters::{CommandRunner, RunnerError};
use kiln_core::{BuildOutput, BuildWork, ExitStatus, Repository};

/// Runs the worker inside the server process, against the same sinks and
/// with the same outcome mapping as the subprocess variant.
pub struct InProcessLauncher<R> {
    runner: R,
    git_host: String,
}

impl<R> InProcessLauncher<R> {
    pub fn new(runner: R, git_host: String) -> Self {
        Self { runner, git_host }
    }
}

#[async_trait]
impl<R> WorkerLauncher for InProcessLauncher<R>
where
    R: CommandRunner + Clone + 'static,
{
    async fn run(
        &self,
        repo: &Repository,
        work: &BuildWork,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<ExitStatus, LaunchError> {
        let worker = Worker::new(
            self.runner.clone(),
            repo.path.clone(),
            self.git_host.clone(),
            std::env::vars(),
            &repo.env,
        );

        if let Err(e) = worker
            .checkout(&work.repo_name, &work.branch, &work.commit, out, err)
            .await
        {
            // An undecodable git outcome is the same host defect as an
            // undecodable worker outcome.
            if let CheckoutError::Runner(RunnerError::Termination(e)) = e {
                return Err(e.into());
            }
            tracing::error!(repo = %work.repo_name, error = %e, "checkout failed");
            return Ok(ExitStatus(1));
        }

        match worker.run(&work.command, out, err).await {
            Ok(termination) => Ok(termination.exit_status()),
            Err(WorkerError::Runner(RunnerError::Termination(e))) => Err(e.into()),
            Err(e) => {
                tracing::error!(repo = %work.repo_name, error = %e, "build command failed to run");
                Ok(ExitStatus(1))
            }
        }
    }
}

#[cfg(test)]
#[path = "in_process_tests.rs"]
mod tests;
