// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! workflowerd: the workflower control-plane daemon.
//!
//! Usage: `workflowerd [config.toml]`. The config path may also come from
//! `WORKFLOWER_CONFIG`; addresses are overridable via `WORKFLOWER_*` vars.

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wf_daemon::{Config, Daemon};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WORKFLOWER_CONFIG").ok())
        .map(PathBuf::from);

    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load config");
            std::process::exit(1);
        }
    };

    let daemon = match Daemon::start(config).await {
        Ok(daemon) => daemon,
        Err(err) => {
            tracing::error!(error = %err, "failed to start daemon");
            std::process::exit(1);
        }
    };

    wait_for_shutdown_signal().await;
    tracing::info!("shutting down");
    daemon.stop().await;
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = match signal(SignalKind::interrupt()) {
        Ok(signal) => signal,
        Err(err) => {
            tracing::error!(error = %err, "failed to install signal handler");
            return;
        }
    };
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(err) => {
            tracing::error!(error = %err, "failed to install signal handler");
            return;
        }
    };
    let mut quit = match signal(SignalKind::quit()) {
        Ok(signal) => signal,
        Err(err) => {
            tracing::error!(error = %err, "failed to install signal handler");
            return;
        }
    };

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
