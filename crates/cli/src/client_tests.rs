// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample_work() -> BuildWork {
    BuildWork {
        repo_name: "org/app".to_string(),
        branch: "main".to_string(),
        commit: "abc123".to_string(),
        command: vec!["make".to_string(), "test".to_string()],
    }
}

#[tokio::test]
async fn sends_the_job_and_mirrors_the_status() {
    let (client_io, server_io) = tokio::io::duplex(4096);

    let server_task = tokio::spawn(async move {
        let mut session = Session::server(server_io);

        let mut work_ch = session.accept().await.unwrap();
        let received = work_ch.recv_work().await.unwrap();

        let out_ch = session.accept().await.unwrap();
        let err_ch = session.accept().await.unwrap();
        let status_ch = session.accept().await.unwrap();

        out_ch.send(b"building\n").unwrap();
        err_ch.send(b"warning\n").unwrap();
        out_ch.close();
        err_ch.close();
        status_ch.send_status(ExitStatus(7)).unwrap();

        received
    });

    let status = run_build(client_io, &sample_work()).await.unwrap();

    assert_eq!(status, ExitStatus(7));
    assert_eq!(server_task.await.unwrap(), sample_work());
}

#[tokio::test]
async fn success_status_is_zero() {
    let (client_io, server_io) = tokio::io::duplex(4096);

    let server_task = tokio::spawn(async move {
        let mut session = Session::server(server_io);
        for _ in 0..3 {
            session.accept().await.unwrap();
        }
        let status_ch = session.accept().await.unwrap();
        status_ch.send_status(ExitStatus::SUCCESS).unwrap();
    });

    let status = run_build(client_io, &sample_work()).await.unwrap();
    assert_eq!(status, ExitStatus::SUCCESS);
    server_task.await.unwrap();
}

#[tokio::test]
async fn server_abort_without_status_is_an_error() {
    let (client_io, server_io) = tokio::io::duplex(4096);

    let server_task = tokio::spawn(async move {
        let mut session = Session::server(server_io);
        // Accept everything, then drop without writing a status: the
        // unknown-repository path. The client must not report success.
        for _ in 0..4 {
            session.accept().await.unwrap();
        }
    });

    let result = run_build(client_io, &sample_work()).await;
    server_task.await.unwrap();

    assert!(matches!(result, Err(SessionError::StatusEof)));
}

#[tokio::test]
async fn refusing_the_session_fails_the_open() {
    let (client_io, server_io) = tokio::io::duplex(4096);

    // Peer hangs up immediately.
    drop(server_io);

    let result = run_build(client_io, &sample_work()).await;
    assert!(matches!(result, Err(SessionError::ConnectionClosed)));
}
