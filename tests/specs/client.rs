//! kiln client specs

use crate::prelude::*;

#[test]
fn version_is_printed() {
    kiln()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kiln"));
}

#[test]
fn missing_arguments_are_a_usage_error() {
    kiln().assert().failure().code(2);
}

#[test]
fn build_command_must_follow_a_separator() {
    // Without `--` there is no build command to run.
    kiln()
        .args(["127.0.0.1:7777", "org/app", "main", "abc123"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn unreachable_bot_fails_without_a_false_success() {
    // Nothing listens on a reserved port; the client must not exit 0.
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = unused.local_addr().unwrap().port();
    drop(unused);

    kiln()
        .arg(format!("127.0.0.1:{port}"))
        .args(["org/app", "main", "abc123", "--", "true"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("could not connect"));
}
