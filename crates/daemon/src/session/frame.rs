// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing for session channels
//!
//! Every frame is `[op: u8][kind: u8][payload len: u32 BE][payload]`.
//! Payloads appear only on data frames.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload either side will send or accept in one frame.
pub const MAX_PAYLOAD: usize = 1024 * 1024;

/// The four channels of a build session, in mandatory open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// One JSON job descriptor, client to server.
    Work,
    /// Raw forwarded build stdout, server to client.
    Stdout,
    /// Raw forwarded build stderr, server to client.
    Stderr,
    /// Exactly four big-endian status bytes, server to client.
    Status,
}

impl ChannelKind {
    /// The positional contract of the protocol, kept as an explicit
    /// sequence: channels open and accept in exactly this order.
    pub const ORDER: [ChannelKind; 4] = [
        ChannelKind::Work,
        ChannelKind::Stdout,
        ChannelKind::Stderr,
        ChannelKind::Status,
    ];

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Work => 0,
            Self::Stdout => 1,
            Self::Stderr => 2,
            Self::Status => 3,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Work),
            1 => Some(Self::Stdout),
            2 => Some(Self::Stderr),
            3 => Some(Self::Status),
            _ => None,
        }
    }

    /// Position in [`Self::ORDER`].
    pub(crate) fn index(self) -> usize {
        self.as_u8() as usize
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Work => "work",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Status => "status",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameOp {
    /// Request a channel; answered by `Accept`.
    Open,
    /// Complete the peer's pending `Open`.
    Accept,
    /// Channel payload bytes.
    Data,
    /// Half-close: no more payload on this channel.
    Close,
}

impl FrameOp {
    fn as_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Accept => 1,
            Self::Data => 2,
            Self::Close => 3,
        }
    }

    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Open),
            1 => Some(Self::Accept),
            2 => Some(Self::Data),
            3 => Some(Self::Close),
            _ => None,
        }
    }
}

/// Framing errors
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("connection closed")]
    Closed,
    #[error("unknown frame op {0}")]
    UnknownOp(u8),
    #[error("unknown channel kind {0}")]
    UnknownKind(u8),
    #[error("frame payload of {0} bytes exceeds the limit")]
    PayloadTooLarge(usize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub op: FrameOp,
    pub kind: ChannelKind,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn open(kind: ChannelKind) -> Self {
        Self {
            op: FrameOp::Open,
            kind,
            payload: Vec::new(),
        }
    }

    pub fn accept(kind: ChannelKind) -> Self {
        Self {
            op: FrameOp::Accept,
            kind,
            payload: Vec::new(),
        }
    }

    pub fn data(kind: ChannelKind, payload: Vec<u8>) -> Self {
        Self {
            op: FrameOp::Data,
            kind,
            payload,
        }
    }

    pub fn close(kind: ChannelKind) -> Self {
        Self {
            op: FrameOp::Close,
            kind,
            payload: Vec::new(),
        }
    }
}

/// Read one frame; a clean EOF between frames is `FrameError::Closed`.
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 6];
    if let Err(e) = reader.read_exact(&mut header).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => FrameError::Closed,
            _ => FrameError::Io(e),
        });
    }

    let op = FrameOp::from_u8(header[0]).ok_or(FrameError::UnknownOp(header[0]))?;
    let kind = ChannelKind::from_u8(header[1]).ok_or(FrameError::UnknownKind(header[1]))?;
    let len = u32::from_be_bytes([header[2], header[3], header[4], header[5]]) as usize;
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Frame { op, kind, payload })
}

/// Write one frame and flush it.
pub(crate) async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    if frame.payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge(frame.payload.len()));
    }

    let len = frame.payload.len() as u32;
    let mut header = [0u8; 6];
    header[0] = frame.op.as_u8();
    header[1] = frame.kind.as_u8();
    header[2..6].copy_from_slice(&len.to_be_bytes());

    writer.write_all(&header).await?;
    writer.write_all(&frame.payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
