// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output sinks for streamed build output

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Destination for a build's streamed stdout or stderr bytes.
///
/// Implemented by the session's channels on the server side and by the
/// process's own stdio in worker mode, so the same worker code serves both.
#[async_trait]
pub trait BuildOutput: Send {
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;
}

/// Adapter from any async writer to a build output sink.
pub struct IoSink<W>(pub W);

#[async_trait]
impl<W> BuildOutput for IoSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        AsyncWriteExt::write_all(&mut self.0, buf).await?;
        self.0.flush().await
    }
}

/// In-memory sink, used by tests to capture output.
#[async_trait]
impl BuildOutput for Vec<u8> {
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }
}

/// Stream a reader's bytes into a sink until EOF, preserving order.
pub async fn relay<R>(mut reader: R, sink: &mut dyn BuildOutput) -> std::io::Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        sink.write_all(&buf[..n]).await?;
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
