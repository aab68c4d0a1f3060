// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkout state machine

use kiln_adapters::{CommandRunner, RunnerError};
use kiln_core::{BuildOutput, Termination};
use std::path::PathBuf;
use thiserror::Error;

/// Progress of bringing a working directory to a specific commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing verified yet.
    Uninitialized,
    /// The working directory holds a clone (fresh or pre-existing).
    Cloned,
    /// Remote refs are up to date.
    Fetched,
    /// The requested commit is checked out.
    CheckedOut,
}

/// Checkout errors
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("git {step} did not succeed: {termination}")]
    StepFailed {
        step: &'static str,
        termination: Termination,
    },
    #[error("could not prepare working directory: {0}")]
    Workdir(std::io::Error),
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Brings a fixed working directory to a specific commit.
///
/// Transitions run strictly in order. A directory that already contains
/// version-control metadata skips the clone; the fetch always runs; the
/// commit is checked out detached. Any failed step aborts the job before the
/// build command ever runs.
pub struct CheckoutMachine {
    workdir: PathBuf,
    git_host: String,
    repo_name: String,
    commit: String,
    state: CheckoutState,
}

impl CheckoutMachine {
    pub fn new(workdir: PathBuf, git_host: String, repo_name: String, commit: String) -> Self {
        Self {
            workdir,
            git_host,
            repo_name,
            commit,
            state: CheckoutState::Uninitialized,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Remote URL derived from the repository name.
    pub fn remote_url(&self) -> String {
        format!("{}:{}.git", self.git_host, self.repo_name)
    }

    /// Drive the machine to `CheckedOut`, stopping at the first failure.
    pub async fn run(
        &mut self,
        runner: &dyn CommandRunner,
        env: &[(String, String)],
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<(), CheckoutError> {
        while self.state != CheckoutState::CheckedOut {
            self.advance(runner, env, out, err).await?;
        }
        Ok(())
    }

    async fn advance(
        &mut self,
        runner: &dyn CommandRunner,
        env: &[(String, String)],
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::Uninitialized => {
                if self.workdir.join(".git").exists() {
                    tracing::debug!(workdir = %self.workdir.display(), "clone skipped");
                } else {
                    let url = self.remote_url();
                    self.git(runner, env, "clone", &[&url, "."], out, err).await?;
                }
                self.state = CheckoutState::Cloned;
            }
            CheckoutState::Cloned => {
                self.git(runner, env, "fetch", &[], out, err).await?;
                self.state = CheckoutState::Fetched;
            }
            CheckoutState::Fetched => {
                let commit = self.commit.clone();
                self.git(runner, env, "checkout", &[&commit], out, err)
                    .await?;
                self.state = CheckoutState::CheckedOut;
            }
            CheckoutState::CheckedOut => {}
        }
        Ok(())
    }

    async fn git(
        &self,
        runner: &dyn CommandRunner,
        env: &[(String, String)],
        step: &'static str,
        extra: &[&str],
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<(), CheckoutError> {
        let mut args = vec![step.to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));

        match runner
            .run(&self.workdir, "git", &args, Some(env), out, err)
            .await?
        {
            Termination::Exited(0) => Ok(()),
            termination => Err(CheckoutError::StepFailed { step, termination }),
        }
    }
}

#[cfg(test)]
#[path = "checkout_tests.rs"]
mod tests;
