// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository registry resolved once at server startup

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One rule for combining with an inherited environment variable.
///
/// `prepend` puts the value in front of an existing variable, separated by
/// the platform path-list separator; otherwise the value goes after it. A
/// variable absent from the base is set verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvOverride {
    pub name: String,
    pub value: String,
    pub prepend: bool,
}

/// A buildable repository known to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    /// Absolute checkout directory for this repository's builds.
    pub path: PathBuf,
    /// Overrides applied in order on top of the worker's inherited
    /// environment.
    pub env: Vec<EnvOverride>,
}

/// Registry construction errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate repository name: {0}")]
    DuplicateName(String),
    #[error("repository name is empty")]
    EmptyName,
}

/// Immutable name-to-repository mapping.
///
/// Built once from configuration, then shared read-only across connection
/// tasks. Never mutated afterward.
#[derive(Debug, Clone, Default)]
pub struct RepoRegistry {
    repos: Vec<Repository>,
}

impl RepoRegistry {
    /// Build a registry, rejecting empty and duplicate names.
    pub fn new(repos: Vec<Repository>) -> Result<Self, RegistryError> {
        for (i, repo) in repos.iter().enumerate() {
            if repo.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if repos[..i].iter().any(|r| r.name == repo.name) {
                return Err(RegistryError::DuplicateName(repo.name.clone()));
            }
        }
        Ok(Self { repos })
    }

    /// Resolve a repository by exact name.
    pub fn resolve(&self, name: &str) -> Option<&Repository> {
        self.repos.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
