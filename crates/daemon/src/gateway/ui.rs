// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI gateway: one-way WebSocket stream of status and log events for
//! dashboards. Inbound frames are ignored.

use super::GatewayError;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wf_core::{by_type, EventKind};
use wf_engine::Bus;

/// Event kinds a UI client sees.
const BROADCAST: [EventKind; 4] = [
    EventKind::BuildStatus,
    EventKind::JobStatus,
    EventKind::TaskStatus,
    EventKind::TaskLog,
];

pub struct UiGateway {
    cancel: CancellationToken,
    local_addr: std::net::SocketAddr,
}

impl UiGateway {
    pub async fn start(bus: Bus, address: &str) -> Result<Self, GatewayError> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;
        let cancel = CancellationToken::new();

        tokio::spawn(run_acceptor(listener, bus, cancel.child_token()));
        tracing::info!(address = %local_addr, "ui gateway listening");

        Ok(Self { cancel, local_addr })
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn run_acceptor(listener: TcpListener, bus: Bus, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "ui client connected");
                        tokio::spawn(run_client(stream, bus.clone(), cancel.child_token()));
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "ui gateway: accept failed");
                    }
                }
            }
        }
    }
}

async fn run_client(stream: TcpStream, bus: Bus, cancel: CancellationToken) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(err) => {
            tracing::error!(error = %err, "ui gateway: handshake failed");
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();
    let mut subscription = bus.subscribe(vec![by_type(BROADCAST)]);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }

            event = subscription.events.recv() => {
                let Some(event) = event else { return };
                let Ok(frame) = serde_json::to_string(&event) else { continue };
                if sink.send(Message::text(frame)).await.is_err() {
                    return;
                }
            }

            message = stream.next() => {
                match message {
                    None | Some(Ok(Message::Close(_))) | Some(Err(_)) => return,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "ui_tests.rs"]
mod tests;
