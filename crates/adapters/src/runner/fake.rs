// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake command runner for testing

use super::{CommandRunner, RunnerError};
use async_trait::async_trait;
use kiln_core::{BuildOutput, Termination};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Recorded runner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCall {
    pub cwd: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    pub env: Option<Vec<(String, String)>>,
}

/// Scripted result for one invocation.
///
/// Unscripted invocations succeed with exit code 0 and no output.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    outcome: Outcome,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Terminated(Termination),
    SpawnFailure,
}

impl ScriptedRun {
    pub fn exits(code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: Outcome::Terminated(Termination::Exited(code)),
        }
    }

    pub fn signaled(signal: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: Outcome::Terminated(Termination::Signaled(signal)),
        }
    }

    pub fn spawn_failure() -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: Outcome::SpawnFailure,
        }
    }

    pub fn with_stdout(mut self, bytes: &[u8]) -> Self {
        self.stdout = bytes.to_vec();
        self
    }

    pub fn with_stderr(mut self, bytes: &[u8]) -> Self {
        self.stderr = bytes.to_vec();
        self
    }
}

/// Fake command runner for testing
#[derive(Clone, Default)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<RunnerCall>>>,
    script: Arc<Mutex<VecDeque<ScriptedRun>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted result for the next unscripted invocation.
    pub fn push(&self, run: ScriptedRun) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(run);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Recorded `program arg arg ...` lines, for order assertions.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| {
                let mut line = c.program.clone();
                for arg in &c.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            })
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        cwd: &Path,
        program: &str,
        args: &[String],
        env: Option<&[(String, String)]>,
        out: &mut dyn BuildOutput,
        err: &mut dyn BuildOutput,
    ) -> Result<Termination, RunnerError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RunnerCall {
                cwd: cwd.to_path_buf(),
                program: program.to_string(),
                args: args.to_vec(),
                env: env.map(<[(String, String)]>::to_vec),
            });

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| ScriptedRun::exits(0));

        // Same contract as the real runner: trace line first, then output.
        let trace = format!("Running command {} {}\n", program, args.join(" "));
        out.write_all(trace.as_bytes()).await?;
        out.write_all(&scripted.stdout).await?;
        err.write_all(&scripted.stderr).await?;

        match scripted.outcome {
            Outcome::Terminated(termination) => Ok(termination),
            Outcome::SpawnFailure => Err(RunnerError::Spawn {
                program: program.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
