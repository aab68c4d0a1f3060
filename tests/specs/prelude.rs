//! Shared helpers for binary specs

use assert_cmd::Command;
use std::path::PathBuf;

pub use predicates::prelude::*;

pub fn kilnd() -> Command {
    Command::cargo_bin("kilnd").expect("kilnd binary")
}

pub fn kiln() -> Command {
    Command::cargo_bin("kiln").expect("kiln binary")
}

pub fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("kiln.json");
    std::fs::write(&path, body).expect("write config");
    path
}
