//! kilnd specs
//!
//! The serve and worker exit codes are part of the CLI contract.

use crate::prelude::*;

#[test]
fn version_is_printed() {
    kilnd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kilnd"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    kilnd().assert().failure().code(2);
}

#[test]
fn serve_with_missing_config_exits_3() {
    kilnd()
        .args(["serve", "/kiln-no-such-config.json"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("could not load config"));
}

#[test]
fn serve_with_invalid_json_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "{broken");

    kilnd()
        .args(["serve"])
        .arg(&config)
        .assert()
        .failure()
        .code(3);
}

#[test]
fn serve_with_no_repositories_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, r#"{"port": 0, "repositories": []}"#);

    kilnd()
        .args(["serve"])
        .arg(&config)
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("no repositories"));
}

#[test]
fn serve_with_duplicate_repositories_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        r#"{"port": 0, "repositories": [
            {"name": "a", "path": "x"},
            {"name": "a", "path": "y"}
        ]}"#,
    );

    kilnd()
        .args(["serve"])
        .arg(&config)
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("duplicate repository name"));
}

#[test]
fn serve_on_an_occupied_port_exits_4() {
    // Hold the port so the bot cannot bind it.
    let holder = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let port = holder.local_addr().unwrap().port();

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        &format!(
            r#"{{"port": {port}, "repositories": [{{"name": "a", "path": "x"}}]}}"#
        ),
    );

    kilnd()
        .args(["serve"])
        .arg(&config)
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("listen failed"));
}

#[test]
fn worker_with_bad_env_json_exits_8() {
    let dir = tempfile::tempdir().unwrap();

    kilnd()
        .args(["worker", "--repo", "org/app", "--branch", "main", "--commit", "abc"])
        .arg("--path")
        .arg(dir.path())
        .args(["--env", "{broken", "--", "true"])
        .assert()
        .failure()
        .code(8)
        .stderr(predicate::str::contains("could not parse env overrides"));
}

#[test]
fn worker_requires_a_build_command() {
    kilnd()
        .args(["worker", "--repo", "org/app", "--path", "/tmp/x", "--branch", "main", "--commit", "abc"])
        .assert()
        .failure()
        .code(2);
}
