// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build worker: checkout, then run the build command

use crate::checkout::{CheckoutError, CheckoutMachine};
use kiln_adapters::{CommandRunner, RunnerError};
use kiln_core::{merge_env, BuildOutput, EnvOverride, Termination};
use std::path::PathBuf;
use thiserror::Error;

/// Worker errors
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("build command is empty")]
    EmptyCommand,
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Runs one build job against a fixed working directory.
///
/// The environment is merged once at construction and applied to every
/// subprocess the worker spawns, git steps included.
pub struct Worker<R> {
    runner: R,
    workdir: PathBuf,
    git_host: String,
    env: Vec<(String, String)>,
}

impl<R: CommandRunner> Worker<R> {
    pub fn new<I>(
        runner: R,
        workdir: PathBuf,
        git_host: String,
        base_env: I,
        overrides: &[EnvOverride],
    ) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            runner,
            workdir,
            git_host,
            env: merge_env(base_env, overrides),
        }
    }

    /// The merged environment applied to worker subprocesses.
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Bring the working directory (created if absent) to the requested
    /// commit. `branch` is context for logging only.
    pub async fn checkout(
        &self,
        repo_name: &str,
        branch: &str,
        commit: &str,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<(), CheckoutError> {
        tracing::info!(repo = repo_name, branch, commit, "checking out");

        tokio::fs::create_dir_all(&self.workdir)
            .await
            .map_err(CheckoutError::Workdir)?;

        let mut machine = CheckoutMachine::new(
            self.workdir.clone(),
            self.git_host.clone(),
            repo_name.to_string(),
            commit.to_string(),
        );
        machine.run(&self.runner, &self.env, out, err).await
    }

    /// Run the build command with the merged environment, propagating the
    /// child's termination unchanged.
    pub async fn run(
        &self,
        command: &[String],
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<Termination, WorkerError> {
        let (program, args) = command.split_first().ok_or(WorkerError::EmptyCommand)?;
        tracing::info!(program, "running build command");

        Ok(self
            .runner
            .run(&self.workdir, program, args, Some(&self.env), out, err)
            .await?)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
