// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess worker launcher

use super::{LaunchError, WorkerLauncher};
use async_trait::async_trait;
use kiln_core::{decode_termination, relay, BuildOutput, BuildWork, ExitStatus, Repository, Termination};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::Command;

/// Launches the worker as a child process of the server: the `kilnd` binary
/// re-invoked in worker mode, its stdio relayed to the session channels.
pub struct SubprocessLauncher {
    worker_cmd: PathBuf,
    git_host: String,
}

impl SubprocessLauncher {
    pub fn new(worker_cmd: PathBuf, git_host: String) -> Self {
        Self {
            worker_cmd,
            git_host,
        }
    }

    /// Worker-mode argv for one job. The env overrides travel as JSON.
    fn worker_args(&self, repo: &Repository, work: &BuildWork) -> Result<Vec<String>, serde_json::Error> {
        let env_json = serde_json::to_string(&repo.env)?;
        let mut args = vec![
            "worker".to_string(),
            "--repo".to_string(),
            work.repo_name.clone(),
            "--path".to_string(),
            repo.path.display().to_string(),
            "--branch".to_string(),
            work.branch.clone(),
            "--commit".to_string(),
            work.commit.clone(),
            "--git-host".to_string(),
            self.git_host.clone(),
            "--env".to_string(),
            env_json,
            "--".to_string(),
        ];
        args.extend(work.command.iter().cloned());
        Ok(args)
    }
}

#[async_trait]
impl WorkerLauncher for SubprocessLauncher {
    async fn run(
        &self,
        repo: &Repository,
        work: &BuildWork,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<ExitStatus, LaunchError> {
        let args = self.worker_args(repo, work)?;

        let mut child = match Command::new(&self.worker_cmd)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                // A worker that cannot start is a plain job failure on the
                // wire, not a server failure.
                tracing::error!(worker_cmd = %self.worker_cmd.display(), error = %e, "could not start worker");
                return Ok(ExitStatus(1));
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (out_res, err_res, status) = tokio::join!(
            drain(stdout, out),
            drain(stderr, err),
            child.wait(),
        );
        out_res?;
        err_res?;

        let termination = decode_termination(status?)?;
        match termination {
            Termination::Exited(code) => {
                tracing::info!(code, "worker exited");
            }
            Termination::Signaled(signal) => {
                tracing::error!(signal, "worker terminated by signal");
            }
        }
        Ok(termination.exit_status())
    }
}

async fn drain<R>(pipe: Option<R>, sink: &mut dyn BuildOutput) -> std::io::Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    match pipe {
        Some(pipe) => relay(pipe, sink).await,
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
