// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server configuration: the JSON repository registry file.

use kiln_core::{EnvOverride, RegistryError, RepoRegistry, Repository};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Remote host used to derive clone URLs when the config names none.
pub const DEFAULT_GIT_HOST: &str = "git@github.com";

/// Config errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("there are no repositories")]
    NoRepositories,
    #[error("repository {name} has an empty path")]
    EmptyPath { name: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ConfigError {
    /// Read/parse failures versus a config that parsed but is invalid.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Parse { .. })
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    port: u16,
    #[serde(default)]
    git_host: Option<String>,
    #[serde(default)]
    repositories: Vec<RepoEntry>,
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    name: String,
    path: String,
    #[serde(default)]
    env: Vec<EnvOverride>,
}

/// Runtime server configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub git_host: String,
    pub registry: RepoRegistry,
}

/// Load a config file. Repository paths resolve relative to the config
/// file's own directory.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let abs = std::fs::canonicalize(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw = std::fs::read_to_string(&abs).map_err(|e| ConfigError::Read {
        path: abs.clone(),
        source: e,
    })?;
    let file: ConfigFile = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: abs.clone(),
        source: e,
    })?;

    if file.repositories.is_empty() {
        return Err(ConfigError::NoRepositories);
    }

    let config_dir = abs.parent().unwrap_or_else(|| Path::new("/"));
    let mut repos = Vec::with_capacity(file.repositories.len());
    for entry in file.repositories {
        if entry.path.is_empty() {
            return Err(ConfigError::EmptyPath { name: entry.name });
        }
        repos.push(Repository {
            name: entry.name,
            path: config_dir.join(entry.path),
            env: entry.env,
        });
    }

    Ok(Config {
        port: file.port,
        git_host: file.git_host.unwrap_or_else(|| DEFAULT_GIT_HOST.to_string()),
        registry: RepoRegistry::new(repos)?,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
