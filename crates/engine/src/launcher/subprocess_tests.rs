// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use kiln_core::EnvOverride;

fn repo() -> Repository {
    Repository {
        name: "org/app".to_string(),
        path: "/srv/app".into(),
        env: vec![EnvOverride {
            name: "PATH".to_string(),
            value: "/custom/bin".to_string(),
            prepend: true,
        }],
    }
}

fn work() -> BuildWork {
    BuildWork {
        repo_name: "org/app".to_string(),
        branch: "main".to_string(),
        commit: "abc123".to_string(),
        command: vec!["make".to_string(), "test".to_string()],
    }
}

#[test]
fn worker_args_carry_the_whole_job() {
    let launcher = SubprocessLauncher::new("/usr/bin/kilnd".into(), "git@github.com".to_string());

    let args = launcher.worker_args(&repo(), &work()).unwrap();

    let env_json = serde_json::to_string(&repo().env).unwrap();
    assert_eq!(
        args,
        vec![
            "worker",
            "--repo",
            "org/app",
            "--path",
            "/srv/app",
            "--branch",
            "main",
            "--commit",
            "abc123",
            "--git-host",
            "git@github.com",
            "--env",
            env_json.as_str(),
            "--",
            "make",
            "test",
        ]
    );
}

#[tokio::test]
async fn unstartable_worker_is_a_plain_job_failure() {
    let launcher = SubprocessLauncher::new(
        "/kiln-no-such-binary".into(),
        "git@github.com".to_string(),
    );
    let (mut out, mut err) = (Vec::new(), Vec::new());

    let status = launcher
        .run(&repo(), &work(), &mut out, &mut err)
        .await
        .unwrap();

    assert_eq!(status, ExitStatus(1));
}

#[tokio::test]
async fn worker_exit_code_becomes_the_status() {
    // Any executable standing in for the worker exercises the status path.
    let launcher = SubprocessLauncher::new("/bin/sh".into(), "git@github.com".to_string());
    let (mut out, mut err) = (Vec::new(), Vec::new());

    // /bin/sh parses none of the worker flags; it fails with its own
    // non-zero code, which must be reported as-is.
    let status = launcher
        .run(&repo(), &work(), &mut out, &mut err)
        .await
        .unwrap();

    assert_ne!(status, ExitStatus::SUCCESS);
}
