// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! kiln - remote build client

mod client;

use clap::Parser;
use kiln_core::BuildWork;
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "kiln", version, about = "Submit a build to a kiln bot")]
struct Cli {
    /// Bot address, host:port
    addr: String,

    /// Repository name known to the bot
    repo: String,

    /// Branch name (context for logs)
    branch: String,

    /// Commit to check out
    commit: String,

    /// Build command
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let work = BuildWork {
        repo_name: cli.repo,
        branch: cli.branch,
        commit: cli.commit,
        command: cli.command,
    };

    let stream = match TcpStream::connect(&cli.addr).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(addr = %cli.addr, error = %e, "could not connect to bot");
            std::process::exit(1);
        }
    };

    match client::run_build(stream, &work).await {
        // The job's status becomes this process's own exit code.
        Ok(status) => std::process::exit(status.0),
        Err(e) => {
            tracing::error!(error = %e, "build session failed");
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
