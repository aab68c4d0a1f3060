// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! kilnd - the kiln build bot
//!
//! `serve` listens for build jobs over TCP; `worker` is the checkout-and-
//! build child process the server spawns for each job.

use clap::{Args, Parser, Subcommand};
use kiln_adapters::ProcessRunner;
use kiln_core::{BuildOutput, EnvOverride, IoSink, Termination};
use kiln_daemon::config;
use kiln_daemon::server::{BuildServer, ServeError};
use kiln_engine::SubprocessLauncher;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

// Process exit codes, part of the CLI contract. Flag-parse failures exit
// with clap's own code 2.
const EXIT_ERROR: u8 = 1;
const EXIT_PARSE_CONFIG: u8 = 3;
const EXIT_LISTEN: u8 = 4;
const EXIT_INVALID_CONFIG: u8 = 5;
const EXIT_ACCEPT: u8 = 6;
const EXIT_WORKER: u8 = 7;
const EXIT_PARSE_ENV: u8 = 8;

#[derive(Parser)]
#[command(name = "kilnd", version, about = "kiln build bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve build jobs over TCP
    Serve(ServeArgs),
    /// Run one checkout-and-build job (spawned by the server)
    Worker(WorkerArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Path to the JSON repository config file
    config: PathBuf,
}

#[derive(Args)]
struct WorkerArgs {
    /// Repository name
    #[arg(long)]
    repo: String,

    /// Absolute checkout directory
    #[arg(long)]
    path: PathBuf,

    /// Branch name (context for logs)
    #[arg(long)]
    branch: String,

    /// Commit to check out
    #[arg(long)]
    commit: String,

    /// Remote host used to derive clone URLs
    #[arg(long, default_value = config::DEFAULT_GIT_HOST)]
    git_host: String,

    /// JSON-encoded list of environment overrides
    #[arg(long, default_value = "[]")]
    env: String,

    /// Build command
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Worker(args) => worker(args).await,
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

async fn serve(args: ServeArgs) -> ExitCode {
    let config = match config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(config = %args.config.display(), error = %e, "could not load config");
            return if e.is_parse_failure() {
                ExitCode::from(EXIT_PARSE_CONFIG)
            } else {
                ExitCode::from(EXIT_INVALID_CONFIG)
            };
        }
    };

    // The server re-invokes its own binary in worker mode.
    let worker_cmd = match std::env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(error = %e, "could not determine own binary path");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(port = config.port, error = %e, "listen failed");
            return ExitCode::from(EXIT_LISTEN);
        }
    };
    match listener.local_addr() {
        Ok(addr) => {
            tracing::info!(%addr, repositories = config.registry.len(), "bot is listening");
            // Parseable readiness line for anything supervising the bot.
            println!("READY {}", addr);
        }
        Err(e) => {
            tracing::error!(error = %e, "listen failed");
            return ExitCode::from(EXIT_LISTEN);
        }
    }

    let launcher = Arc::new(SubprocessLauncher::new(worker_cmd, config.git_host.clone()));
    let server = BuildServer::new(config.registry, launcher);

    match server.serve(listener).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ ServeError::Accept(_)) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::from(EXIT_ACCEPT)
        }
        Err(e @ ServeError::Fatal(_)) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn worker(args: WorkerArgs) -> ExitCode {
    let overrides: Vec<EnvOverride> = match serde_json::from_str(&args.env) {
        Ok(overrides) => overrides,
        Err(e) => {
            tracing::error!(error = %e, "could not parse env overrides");
            return ExitCode::from(EXIT_PARSE_ENV);
        }
    };

    let worker = kiln_engine::Worker::new(
        ProcessRunner::new(),
        args.path.clone(),
        args.git_host.clone(),
        std::env::vars(),
        &overrides,
    );
    let mut out = IoSink(tokio::io::stdout());
    let mut err = IoSink(tokio::io::stderr());

    let banner = format!(
        "Checking out\nrepo : {}\nbranch : {}\ncommit : {}\n",
        args.repo, args.branch, args.commit
    );
    if err.write_all(banner.as_bytes()).await.is_err() {
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = worker
        .checkout(&args.repo, &args.branch, &args.commit, &mut out, &mut err)
        .await
    {
        tracing::error!(error = %e, "checkout failed");
        return ExitCode::from(EXIT_ERROR);
    }

    match worker.run(&args.command, &mut out, &mut err).await {
        // The build's real exit code becomes the worker's own, so the
        // server can put it on the wire unchanged.
        Ok(Termination::Exited(code)) => ExitCode::from(code as u8),
        Ok(Termination::Signaled(signal)) => {
            tracing::error!(signal, "build command terminated by signal");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            tracing::error!(error = %e, "build command failed to run");
            ExitCode::from(EXIT_WORKER)
        }
    }
}
