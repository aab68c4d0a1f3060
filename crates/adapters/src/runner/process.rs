// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-spawning command runner

use super::{CommandRunner, RunnerError};
use async_trait::async_trait;
use kiln_core::{decode_termination, relay, BuildOutput, Termination};
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::Command;

/// Real subprocess runner used by the worker.
#[derive(Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        cwd: &Path,
        program: &str,
        args: &[String],
        env: Option<&[(String, String)]>,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<Termination, RunnerError> {
        let trace = format!("Running command {} {}\n", program, args.join(" "));
        out.write_all(trace.as_bytes()).await?;

        tracing::debug!(program, cwd = %cwd.display(), "spawning");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(env) = env {
            cmd.env_clear();
            cmd.envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut child = cmd.spawn().map_err(|e| RunnerError::Spawn {
            program: program.to_string(),
            source: e,
        })?;

        // Both pipes drain concurrently so neither can fill and stall the
        // child.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (out_res, err_res, status) = tokio::join!(
            drain(stdout, out),
            drain(stderr, err),
            child.wait(),
        );
        out_res?;
        err_res?;
        Ok(decode_termination(status?)?)
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
#[path = "process_tests.rs"]
mod tests;
