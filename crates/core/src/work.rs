// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build job descriptor

use serde::{Deserialize, Serialize};

/// One requested build: which repository, which commit, what to run.
///
/// Produced by the client and consumed exactly once by the server; a session
/// carries exactly one of these. `branch` is context for logging only —
/// `commit` is the authoritative checkout target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildWork {
    pub repo_name: String,
    pub branch: String,
    pub commit: String,
    /// Argv-style command, never a shell string.
    pub command: Vec<String>,
}

#[cfg(test)]
#[path = "work_tests.rs"]
mod tests;
