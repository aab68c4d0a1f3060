// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job exit status and platform termination decoding

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Signed 32-bit job outcome, 0 meaning success.
///
/// Transmitted big-endian as the last and only payload of the status
/// channel; the client terminates its own process with this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus(pub i32);

impl ExitStatus {
    pub const SUCCESS: Self = Self(0);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_be_bytes(bytes))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a subprocess ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with a code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
}

impl Termination {
    /// Collapse to the wire status: the real code for normal exits, 1 for
    /// abnormal termination.
    pub fn exit_status(self) -> ExitStatus {
        match self {
            Self::Exited(code) => ExitStatus(code),
            Self::Signaled(_) => ExitStatus(1),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exit code {}", code),
            Self::Signaled(signal) => write!(f, "signal {}", signal),
        }
    }
}

/// The platform reported a process outcome we cannot decode.
///
/// A configuration defect of the host, not a per-job failure: the server
/// shuts down rather than report a made-up status.
#[derive(Debug, Error)]
#[error("unrecognized process termination for this platform")]
pub struct TerminationError;

/// Decode a process outcome into a numeric termination.
#[cfg(unix)]
pub fn decode_termination(
    status: std::process::ExitStatus,
) -> Result<Termination, TerminationError> {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        return Ok(Termination::Exited(code));
    }
    status
        .signal()
        .map(Termination::Signaled)
        .ok_or(TerminationError)
}

/// Decode a process outcome into a numeric termination.
#[cfg(windows)]
pub fn decode_termination(
    status: std::process::ExitStatus,
) -> Result<Termination, TerminationError> {
    status.code().map(Termination::Exited).ok_or(TerminationError)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
