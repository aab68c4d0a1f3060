// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiplexed build session over a single connection.
//!
//! One session carries exactly one job: four channels, opened by the client
//! and accepted by the server in the fixed order {work, stdout, stderr,
//! status}. Channel kinds are explicit on the wire, but the order is still
//! enforced on both sides, so the positional contract survives any future
//! extension. An open does not complete until the peer's accept answers it
//! — at most one open is ever in flight, which is the protocol's only
//! synchronization point.
//!
//! A reader task demultiplexes incoming frames into per-channel queues so
//! channels cannot head-of-line block each other; a writer task serializes
//! outgoing frames. Both tasks end, and the transport shuts down, once the
//! session and its channels drop.

mod frame;

pub use frame::{ChannelKind, FrameError, MAX_PAYLOAD};

use frame::{read_frame, write_frame, Frame, FrameOp};

use async_trait::async_trait;
use kiln_core::{BuildOutput, BuildWork, ExitStatus};
use thiserror::Error;
use tokio::io::{self, AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("channel {got} out of order, expected {expected}")]
    OutOfOrder {
        expected: ChannelKind,
        got: ChannelKind,
    },
    #[error("all four channels are already in use")]
    Exhausted,
    #[error("malformed job descriptor: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("status channel closed before a status arrived")]
    StatusEof,
}

/// One multiplexed session bound to one connection.
pub struct Session {
    outbound: mpsc::UnboundedSender<Frame>,
    opens: mpsc::Receiver<ChannelKind>,
    accepts: mpsc::Receiver<ChannelKind>,
    inbound: [Option<mpsc::UnboundedReceiver<Vec<u8>>>; 4],
    next: usize,
}

impl Session {
    /// Client role: opens channels.
    pub fn client<T>(io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::new(io)
    }

    /// Server role: accepts channels.
    pub fn server<T>(io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::new(io)
    }

    fn new<T>(io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = io::split(io);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (open_tx, opens) = mpsc::channel(ChannelKind::ORDER.len());
        let (accept_tx, accepts) = mpsc::channel(ChannelKind::ORDER.len());

        let mut data_txs = Vec::with_capacity(ChannelKind::ORDER.len());
        let mut inbound: [Option<mpsc::UnboundedReceiver<Vec<u8>>>; 4] =
            [None, None, None, None];
        for slot in &mut inbound {
            let (tx, rx) = mpsc::unbounded_channel();
            data_txs.push(Some(tx));
            *slot = Some(rx);
        }

        tokio::spawn(read_loop(read_half, open_tx, accept_tx, data_txs));
        tokio::spawn(write_loop(write_half, outbound_rx));

        Self {
            outbound,
            opens,
            accepts,
            inbound,
            next: 0,
        }
    }

    /// Open the next channel. Completes only once the peer has accepted it.
    pub async fn open(&mut self, kind: ChannelKind) -> Result<Channel, SessionError> {
        let expected = self.expected()?;
        if kind != expected {
            return Err(SessionError::OutOfOrder {
                expected,
                got: kind,
            });
        }

        self.outbound
            .send(Frame::open(kind))
            .map_err(|_| SessionError::ConnectionClosed)?;

        let acked = self
            .accepts
            .recv()
            .await
            .ok_or(SessionError::ConnectionClosed)?;
        if acked != kind {
            return Err(SessionError::OutOfOrder {
                expected: kind,
                got: acked,
            });
        }

        self.take_channel(kind)
    }

    /// Accept the next channel the peer opens, completing its open.
    pub async fn accept(&mut self) -> Result<Channel, SessionError> {
        let expected = self.expected()?;

        let kind = self
            .opens
            .recv()
            .await
            .ok_or(SessionError::ConnectionClosed)?;
        if kind != expected {
            return Err(SessionError::OutOfOrder {
                expected,
                got: kind,
            });
        }

        self.outbound
            .send(Frame::accept(kind))
            .map_err(|_| SessionError::ConnectionClosed)?;

        self.take_channel(kind)
    }

    fn expected(&self) -> Result<ChannelKind, SessionError> {
        ChannelKind::ORDER
            .get(self.next)
            .copied()
            .ok_or(SessionError::Exhausted)
    }

    fn take_channel(&mut self, kind: ChannelKind) -> Result<Channel, SessionError> {
        let incoming = self.inbound[kind.index()]
            .take()
            .ok_or(SessionError::Exhausted)?;
        self.next += 1;
        Ok(Channel {
            kind,
            outbound: self.outbound.clone(),
            incoming,
        })
    }
}

/// One byte pipe within a session.
#[derive(Debug)]
pub struct Channel {
    kind: ChannelKind,
    outbound: mpsc::UnboundedSender<Frame>,
    incoming: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Channel {
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Queue bytes for the peer, split into bounded frames.
    pub fn send(&self, buf: &[u8]) -> Result<(), SessionError> {
        for chunk in buf.chunks(MAX_PAYLOAD) {
            self.outbound
                .send(Frame::data(self.kind, chunk.to_vec()))
                .map_err(|_| SessionError::ConnectionClosed)?;
        }
        Ok(())
    }

    /// Next run of bytes from the peer; `None` once the peer half-closes.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.incoming.recv().await
    }

    /// Half-close: tell the peer no more bytes follow on this channel.
    pub fn close(&self) {
        let _ = self.outbound.send(Frame::close(self.kind));
    }

    /// Send one JSON job descriptor, then half-close.
    pub fn send_work(&self, work: &BuildWork) -> Result<(), SessionError> {
        let payload = serde_json::to_vec(work)?;
        self.send(&payload)?;
        self.close();
        Ok(())
    }

    /// Read this channel to EOF and decode exactly one job descriptor.
    pub async fn recv_work(&mut self) -> Result<BuildWork, SessionError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.recv().await {
            buf.extend_from_slice(&chunk);
        }
        Ok(serde_json::from_slice(&buf)?)
    }

    /// The final protocol message: four big-endian status bytes.
    pub fn send_status(&self, status: ExitStatus) -> Result<(), SessionError> {
        self.send(&status.to_be_bytes())
    }

    /// Block until exactly four status bytes arrive.
    pub async fn recv_status(&mut self) -> Result<ExitStatus, SessionError> {
        let mut buf = Vec::with_capacity(4);
        while buf.len() < 4 {
            match self.recv().await {
                Some(chunk) => buf.extend_from_slice(&chunk),
                None => return Err(SessionError::StatusEof),
            }
        }
        Ok(ExitStatus::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
    }
}

/// Channels double as output sinks on the server side.
#[async_trait]
impl BuildOutput for Channel {
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.send(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
    }
}

async fn read_loop<T>(
    mut reader: ReadHalf<T>,
    open_tx: mpsc::Sender<ChannelKind>,
    accept_tx: mpsc::Sender<ChannelKind>,
    mut data_txs: Vec<Option<mpsc::UnboundedSender<Vec<u8>>>>,
) where
    T: AsyncRead + AsyncWrite,
{
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(FrameError::Closed) => break,
            Err(e) => {
                tracing::debug!(error = %e, "session read failed");
                break;
            }
        };

        match frame.op {
            FrameOp::Open => {
                if open_tx.send(frame.kind).await.is_err() {
                    break;
                }
            }
            FrameOp::Accept => {
                if accept_tx.send(frame.kind).await.is_err() {
                    break;
                }
            }
            FrameOp::Data => {
                if let Some(tx) = &data_txs[frame.kind.index()] {
                    // A dropped receiver just discards the bytes.
                    let _ = tx.send(frame.payload);
                }
            }
            FrameOp::Close => {
                data_txs[frame.kind.index()] = None;
            }
        }
    }
    // Dropping the senders delivers EOF to every channel reader.
}

async fn write_loop<T>(mut writer: WriteHalf<T>, mut frames: mpsc::UnboundedReceiver<Frame>)
where
    T: AsyncRead + AsyncWrite,
{
    while let Some(frame) = frames.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame).await {
            tracing::debug!(error = %e, "session write failed");
            return;
        }
    }
    // All senders are gone: the session is over, shut the transport down.
    let _ = writer.shutdown().await;
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
