// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Subprocess adapters for the kiln build agent

pub mod runner;

pub use runner::{CommandRunner, ProcessRunner, RunnerError};

#[cfg(any(test, feature = "test-support"))]
pub use runner::{FakeRunner, RunnerCall, ScriptedRun};
