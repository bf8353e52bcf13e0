// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `haltid` — process entrypoint. Parses arguments, initializes
//! logging, registers (or resumes) with the master, then runs the
//! supervisor and reconciler until terminated.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use halti_adapters::{DockerAdapter, Heartbeat, MasterClient};
use halti_core::engine::EngineAdapter;
use halti_core::notify::MasterNotifier;
use halti_daemon::{config::log_level_directive, lifecycle, supervisor, Config};

/// Node-local container reconciliation agent.
#[derive(Parser)]
#[command(name = "haltid", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Override `HALTI_STATE_FILE` for this invocation.
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Override `LOG_LEVEL` for this invocation (DEBUG|INFO|WARNING|ERROR).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Register (if needed) and run the reconciliation loop until terminated.
    Run,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.state_file {
        std::env::set_var("HALTI_STATE_FILE", path);
    }
    if let Some(level) = &cli.log_level {
        std::env::set_var("LOG_LEVEL", level);
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => match run().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("haltid: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level_directive().into()),
        )
        .init();

    let config = Config::load().context("loading configuration")?;
    info!(
        master_url = %config.master_url,
        bind_ip = %config.port_bind_ip,
        state_file = %config.state_file.display(),
        "starting haltid"
    );

    let master = Arc::new(MasterClient::new(&config.master_url));
    let state = lifecycle::startup(&config, &master).await.context("startup")?;

    let engine: Arc<dyn EngineAdapter> =
        Arc::new(DockerAdapter::new(config.allow_insecure_registry));
    let heartbeat: Arc<dyn Heartbeat> = master.clone();
    let notifier: Arc<dyn MasterNotifier> = master;

    let cancel = CancellationToken::new();
    let supervisor = supervisor::spawn(
        engine,
        heartbeat,
        notifier,
        config.port_bind_ip.clone(),
        Duration::from_secs(state.heartbeat_interval.max(1)),
        cancel.clone(),
    );

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping");
    cancel.cancel();

    let _ = supervisor.supervisor_task.await;
    let _ = supervisor.reconciler_task.await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
