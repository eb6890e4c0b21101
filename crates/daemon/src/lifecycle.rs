// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root: builds the store and the bus, wires every long-lived
//! component, and tears them down in reverse order.

use crate::api::{self, AppState};
use crate::config::Config;
use crate::gateway::{GatewayError, UiGateway, WorkerGateway};
use crate::savers::{EventSaver, LogSaver};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wf_core::SystemClock;
use wf_engine::{Bus, BuildProcessor, JobProcessor, TaskProcessor, Watcher};
use wf_storage::Store;

#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to start api server: {0}")]
    Api(#[from] std::io::Error),

    #[error("failed to start gateway: {0}")]
    Gateway(#[from] GatewayError),
}

pub struct Daemon {
    bus: Bus,
    store: Store,
    watchers: Vec<Watcher>,
    worker_gateway: WorkerGateway,
    ui_gateway: UiGateway,
    api_cancel: CancellationToken,
    api_handle: tokio::task::JoinHandle<()>,
    api_addr: std::net::SocketAddr,
}

impl Daemon {
    pub async fn start(config: Config) -> Result<Self, StartError> {
        let store = Store::new();
        let bus = Bus::new();
        let clock = SystemClock;

        // persistence watchers first so no event escapes the history
        let mut watchers = vec![
            Watcher::spawn(&bus, Arc::new(EventSaver::new(store.clone()))),
            Watcher::spawn(&bus, Arc::new(LogSaver::new(store.clone()))),
        ];

        // the three state machines, serial per subscriber
        watchers.push(Watcher::spawn(
            &bus,
            Arc::new(BuildProcessor::new(store.clone(), bus.clone(), clock)),
        ));
        watchers.push(Watcher::spawn(
            &bus,
            Arc::new(JobProcessor::new(store.clone(), bus.clone(), clock)),
        ));
        watchers.push(Watcher::spawn(
            &bus,
            Arc::new(TaskProcessor::new(store.clone(), bus.clone(), clock)),
        ));

        let worker_gateway = WorkerGateway::start(bus.clone(), &config.worker_io.address).await?;
        let ui_gateway = UiGateway::start(bus.clone(), &config.ui.address).await?;

        let router = api::router(AppState::new(store.clone(), Arc::new(bus.clone())));
        let listener = TcpListener::bind(&config.api.address).await?;
        let api_addr = listener.local_addr()?;
        let api_cancel = CancellationToken::new();
        let shutdown = api_cancel.clone();
        let api_handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(err) = serve.await {
                tracing::error!(error = %err, "api server failed");
            }
        });

        tracing::info!(address = %api_addr, "api listening");

        Ok(Self {
            bus,
            store,
            watchers,
            worker_gateway,
            ui_gateway,
            api_cancel,
            api_handle,
            api_addr,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn api_addr(&self) -> std::net::SocketAddr {
        self.api_addr
    }

    pub fn worker_io_addr(&self) -> std::net::SocketAddr {
        self.worker_gateway.local_addr()
    }

    pub fn ui_addr(&self) -> std::net::SocketAddr {
        self.ui_gateway.local_addr()
    }

    /// Stop cascade: outer surfaces, then processors, then the bus.
    pub async fn stop(self) {
        self.api_cancel.cancel();
        let _ = self.api_handle.await;

        self.worker_gateway.stop();
        self.ui_gateway.stop();

        for watcher in self.watchers {
            watcher.stop().await;
        }

        self.bus.close();
        tracing::info!("daemon stopped");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
