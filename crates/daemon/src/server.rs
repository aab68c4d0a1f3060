// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build server: accepts connections and dispatches jobs to workers.

use crate::session::{Session, SessionError};
use kiln_core::{ExitStatus, RepoRegistry, TerminationError};
use kiln_engine::{LaunchError, WorkerLauncher};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Server errors
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("accept failed: {0}")]
    Accept(std::io::Error),
    #[error("fatal worker failure: {0}")]
    Fatal(#[from] TerminationError),
}

/// Per-connection errors; each terminates only its own connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("unknown repository: {0}")]
    UnknownRepository(String),
    #[error("worker launch failed: {0}")]
    Launch(LaunchError),
}

/// The dispatcher: resolves jobs against the registry and runs one worker
/// per connection.
pub struct BuildServer {
    registry: Arc<RepoRegistry>,
    launcher: Arc<dyn WorkerLauncher>,
}

impl BuildServer {
    pub fn new(registry: RepoRegistry, launcher: Arc<dyn WorkerLauncher>) -> Self {
        Self {
            registry: Arc::new(registry),
            launcher,
        }
    }

    /// Accept loop. Every connection runs in its own task and failures stay
    /// local to it, except a fatal worker failure, which stops the server.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServeError> {
        let (fatal_tx, mut fatal_rx) = mpsc::channel::<TerminationError>(1);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, addr) = accepted.map_err(ServeError::Accept)?;
                    tracing::info!(%addr, "new connection");

                    let registry = Arc::clone(&self.registry);
                    let launcher = Arc::clone(&self.launcher);
                    let fatal_tx = fatal_tx.clone();
                    tokio::spawn(async move {
                        match handle_connection(stream, &registry, launcher.as_ref()).await {
                            Ok(status) => {
                                tracing::info!(%addr, %status, "job finished");
                            }
                            Err(ConnectionError::Launch(LaunchError::Termination(e))) => {
                                tracing::error!(%addr, error = %e, "fatal worker failure");
                                let _ = fatal_tx.try_send(e);
                            }
                            Err(e) => {
                                tracing::error!(%addr, error = %e, "connection failed");
                            }
                        }
                        tracing::info!(%addr, "connection closed");
                    });
                }
                Some(e) = fatal_rx.recv() => {
                    return Err(ServeError::Fatal(e));
                }
            }
        }
    }
}

/// Serve exactly one connection over any transport.
///
/// The protocol steps run in wire order; any failure aborts this connection
/// without a response. An unknown repository closes the session with no
/// status written — the client observes EOF, not a coded failure.
pub async fn handle_connection<T>(
    io: T,
    registry: &RepoRegistry,
    launcher: &dyn WorkerLauncher,
) -> Result<ExitStatus, ConnectionError>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let mut session = Session::server(io);

    let mut work_ch = session.accept().await?;
    let work = work_ch.recv_work().await?;
    tracing::info!(
        repo = %work.repo_name,
        branch = %work.branch,
        commit = %work.commit,
        "received job"
    );

    let mut out_ch = session.accept().await?;
    let mut err_ch = session.accept().await?;
    let status_ch = session.accept().await?;

    let repo = registry
        .resolve(&work.repo_name)
        .ok_or_else(|| ConnectionError::UnknownRepository(work.repo_name.clone()))?
        .clone();

    let status = launcher
        .run(&repo, &work, &mut out_ch, &mut err_ch)
        .await
        .map_err(ConnectionError::Launch)?;

    // The worker has fully terminated; all of its output is already queued
    // ahead of this status write.
    status_ch.send_status(status)?;
    out_ch.close();
    err_ch.close();
    status_ch.close();

    Ok(status)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
