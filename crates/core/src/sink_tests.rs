// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn vec_sink_accumulates_writes() {
    let mut sink = Vec::new();
    BuildOutput::write_all(&mut sink, b"hello ").await.unwrap();
    BuildOutput::write_all(&mut sink, b"world").await.unwrap();
    assert_eq!(sink, b"hello world");
}

#[tokio::test]
async fn io_sink_forwards_to_the_writer() {
    let mut sink = IoSink(Vec::new());
    BuildOutput::write_all(&mut sink, b"bytes").await.unwrap();
    assert_eq!(sink.0, b"bytes");
}

#[tokio::test]
async fn relay_preserves_order_until_eof() {
    let source: &[u8] = b"one two three";
    let mut sink = Vec::new();
    relay(source, &mut sink).await.unwrap();
    assert_eq!(sink, b"one two three");
}
