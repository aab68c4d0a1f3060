// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tokio::time::timeout;

fn pair() -> (Session, Session) {
    let (client_io, server_io) = tokio::io::duplex(1024);
    (Session::client(client_io), Session::server(server_io))
}

fn sample_work() -> BuildWork {
    BuildWork {
        repo_name: "org/app".to_string(),
        branch: "main".to_string(),
        commit: "abc123".to_string(),
        command: vec!["make".to_string(), "test".to_string()],
    }
}

#[tokio::test]
async fn four_channels_open_and_accept_in_order() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let kinds: Vec<ChannelKind> = [
            server.accept().await.unwrap(),
            server.accept().await.unwrap(),
            server.accept().await.unwrap(),
            server.accept().await.unwrap(),
        ]
        .iter()
        .map(Channel::kind)
        .collect();
        kinds
    });

    for kind in ChannelKind::ORDER {
        let channel = client.open(kind).await.unwrap();
        assert_eq!(channel.kind(), kind);
    }

    let accepted = server_task.await.unwrap();
    assert_eq!(accepted, ChannelKind::ORDER.to_vec());
}

#[tokio::test]
async fn data_flows_and_close_delivers_eof() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let mut work_ch = server.accept().await.unwrap();
        let mut received = Vec::new();
        while let Some(chunk) = work_ch.recv().await {
            received.extend_from_slice(&chunk);
        }
        (server, received)
    });

    let work_ch = client.open(ChannelKind::Work).await.unwrap();
    work_ch.send(b"hello ").unwrap();
    work_ch.send(b"world").unwrap();
    work_ch.close();

    let (_server, received) = server_task.await.unwrap();
    assert_eq!(received, b"hello world");
}

#[tokio::test]
async fn opening_out_of_order_is_rejected_locally() {
    let (mut client, _server) = pair();

    let err = client.open(ChannelKind::Stdout).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::OutOfOrder { expected: ChannelKind::Work, got: ChannelKind::Stdout }
    ));
}

#[tokio::test]
async fn open_blocks_until_the_peer_accepts() {
    let (mut client, mut server) = pair();

    // No accept yet: the open cannot complete.
    let blocked = timeout(Duration::from_millis(50), client.open(ChannelKind::Work)).await;
    assert!(blocked.is_err(), "open completed without an accept");

    // The open frame is already on the wire; accepting releases it.
    let server_task = tokio::spawn(async move { server.accept().await });
    let reopened = timeout(Duration::from_secs(1), client.open(ChannelKind::Work)).await;
    assert!(reopened.is_ok(), "open did not complete after accept");
    server_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn work_descriptor_round_trips() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let mut work_ch = server.accept().await.unwrap();
        work_ch.recv_work().await
    });

    let work_ch = client.open(ChannelKind::Work).await.unwrap();
    work_ch.send_work(&sample_work()).unwrap();

    let received = server_task.await.unwrap().unwrap();
    assert_eq!(received, sample_work());
}

#[tokio::test]
async fn malformed_work_is_a_decode_error() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let mut work_ch = server.accept().await.unwrap();
        work_ch.recv_work().await
    });

    let work_ch = client.open(ChannelKind::Work).await.unwrap();
    work_ch.send(b"{not json").unwrap();
    work_ch.close();

    let result = server_task.await.unwrap();
    assert!(matches!(result, Err(SessionError::Decode(_))));
}

#[tokio::test]
async fn status_round_trips_for_known_codes() {
    for code in [0, 1, 2, 127] {
        let (mut client, mut server) = pair();

        let server_task = tokio::spawn(async move {
            for _ in 0..3 {
                server.accept().await.unwrap();
            }
            let status_ch = server.accept().await.unwrap();
            status_ch.send_status(ExitStatus(code)).unwrap();
            server
        });

        client.open(ChannelKind::Work).await.unwrap();
        client.open(ChannelKind::Stdout).await.unwrap();
        client.open(ChannelKind::Stderr).await.unwrap();
        let mut status_ch = client.open(ChannelKind::Status).await.unwrap();

        let status = status_ch.recv_status().await.unwrap();
        assert_eq!(status, ExitStatus(code));
        server_task.await.unwrap();
    }
}

#[tokio::test]
async fn session_teardown_without_status_is_an_eof_error() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        // Accept everything, then drop the whole session without writing a
        // status: the dispatch-failure path.
        for _ in 0..4 {
            server.accept().await.unwrap();
        }
    });

    client.open(ChannelKind::Work).await.unwrap();
    client.open(ChannelKind::Stdout).await.unwrap();
    client.open(ChannelKind::Stderr).await.unwrap();
    let mut status_ch = client.open(ChannelKind::Status).await.unwrap();
    server_task.await.unwrap();

    let result = status_ch.recv_status().await;
    assert!(matches!(result, Err(SessionError::StatusEof)));
}

#[tokio::test]
async fn stdout_and_stderr_do_not_block_each_other() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        server.accept().await.unwrap();
        let out_ch = server.accept().await.unwrap();
        let err_ch = server.accept().await.unwrap();
        let _status_ch = server.accept().await.unwrap();

        // Interleave writes on both channels before the client reads any.
        for i in 0..10u8 {
            out_ch.send(&[i]).unwrap();
            err_ch.send(&[100 + i]).unwrap();
        }
        out_ch.close();
        err_ch.close();
        (server, out_ch, err_ch)
    });

    client.open(ChannelKind::Work).await.unwrap();
    let mut out_ch = client.open(ChannelKind::Stdout).await.unwrap();
    let mut err_ch = client.open(ChannelKind::Stderr).await.unwrap();
    client.open(ChannelKind::Status).await.unwrap();
    let _guard = server_task.await.unwrap();

    let mut out_bytes = Vec::new();
    while let Some(chunk) = out_ch.recv().await {
        out_bytes.extend_from_slice(&chunk);
    }
    let mut err_bytes = Vec::new();
    while let Some(chunk) = err_ch.recv().await {
        err_bytes.extend_from_slice(&chunk);
    }

    // Per-channel order is preserved independently.
    assert_eq!(out_bytes, (0..10u8).collect::<Vec<_>>());
    assert_eq!(err_bytes, (100..110u8).collect::<Vec<_>>());
}
