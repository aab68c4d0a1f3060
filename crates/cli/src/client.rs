// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build submission over a kiln session

use kiln_core::{BuildWork, ExitStatus};
use kiln_daemon::session::{Channel, ChannelKind, Session, SessionError};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Submit one job: open the four channels in protocol order with the
/// prescribed write after each, forward build output to the local stdio,
/// and return the status the server reports.
///
/// The status read is the session's natural end; the forwarding tasks may
/// still be draining buffered output when it lands.
pub async fn run_build<T>(io: T, work: &BuildWork) -> Result<ExitStatus, SessionError>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let mut session = Session::client(io);

    let work_ch = session.open(ChannelKind::Work).await?;
    work_ch.send_work(work)?;

    let out_ch = session.open(ChannelKind::Stdout).await?;
    let err_ch = session.open(ChannelKind::Stderr).await?;
    let mut status_ch = session.open(ChannelKind::Status).await?;

    tokio::spawn(forward(out_ch, tokio::io::stdout()));
    tokio::spawn(forward(err_ch, tokio::io::stderr()));

    status_ch.recv_status().await
}

/// Copy one channel to a local writer until the peer half-closes.
async fn forward<W>(mut channel: Channel, mut writer: W)
where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(chunk) = channel.recv().await {
        if writer.write_all(&chunk).await.is_err() {
            return;
        }
        if writer.flush().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
