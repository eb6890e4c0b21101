// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker gateway: bidirectional WebSocket transport between the bus and
//! remote workers.
//!
//! Outbound, a bus subscription for the four worker-bound commands feeds the
//! send queue; every connected worker drains it. Inbound, decoded frames
//! feed the receive queue, which a single pump re-publishes on the bus.
//! Both queues buffer briefly across reconnects; a failed hand-off is
//! retried once after a delay.

use super::GatewayError;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite as ws;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wf_core::{by_type, decode, Event, EventKind, Publisher};
use wf_engine::{Bus, EventQueue};

const QUEUE_DISCARD_TIMEOUT: Duration = Duration::from_millis(250);
const REQUEUE_TIMEOUT: Duration = Duration::from_secs(1);
const PING_INTERVAL: Duration = Duration::from_secs(25);
const PONG_TIMEOUT: Duration = Duration::from_secs(20);

/// Event kinds forwarded to workers. Results flow the other way.
const OUTBOUND: [EventKind; 4] = [
    EventKind::InitContainerStart,
    EventKind::ScriptStart,
    EventKind::ScriptAbort,
    EventKind::CleanupContainer,
];

pub struct WorkerGateway {
    sendq: EventQueue<Event>,
    recvq: EventQueue<Event>,
    cancel: CancellationToken,
    local_addr: std::net::SocketAddr,
}

impl WorkerGateway {
    /// Bind the gateway and start its accept loop, bus forwarder, and
    /// receive pump.
    pub async fn start(bus: Bus, address: &str) -> Result<Self, GatewayError> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;
        let cancel = CancellationToken::new();

        let sendq = EventQueue::new(QUEUE_DISCARD_TIMEOUT, |event: Event| {
            tracing::debug!(event = event.name(), "worker io: discarding outbound event");
        });
        let recvq = EventQueue::new(QUEUE_DISCARD_TIMEOUT, |event: Event| {
            tracing::debug!(event = event.name(), "worker io: discarding inbound event");
        });

        tokio::spawn(run_forwarder(
            bus.clone(),
            sendq.clone(),
            cancel.child_token(),
        ));
        tokio::spawn(run_receiver(
            bus.clone(),
            recvq.clone(),
            cancel.child_token(),
        ));
        tokio::spawn(run_acceptor(
            listener,
            sendq.clone(),
            recvq.clone(),
            cancel.child_token(),
        ));

        tracing::info!(address = %local_addr, "worker gateway listening");

        Ok(Self {
            sendq,
            recvq,
            cancel,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    pub fn stop(&self) {
        self.cancel.cancel();
        self.sendq.shutdown();
        self.recvq.shutdown();
    }
}

/// Bus → send queue.
async fn run_forwarder(bus: Bus, sendq: EventQueue<Event>, cancel: CancellationToken) {
    let mut subscription = bus.subscribe(vec![by_type(OUTBOUND)]);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            event = subscription.events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("worker io: bus channel closed");
                    return;
                };
                sendq.publish(event);
            }
        }
    }
}

/// Receive queue → bus, with one delayed retry on publish failure.
async fn run_receiver(bus: Bus, recvq: EventQueue<Event>, cancel: CancellationToken) {
    let mut events = recvq.subscribe();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("worker io: receive queue closed");
                    return;
                };

                if let Err(err) = bus.publish(event.clone()) {
                    tracing::error!(error = %err, "worker io: failed to publish worker event");
                    let bus = bus.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        publish_after(&cancel, REQUEUE_TIMEOUT, move || {
                            let _ = bus.publish(event);
                        })
                        .await;
                    });
                }
            }
        }
    }
}

async fn run_acceptor(
    listener: TcpListener,
    sendq: EventQueue<Event>,
    recvq: EventQueue<Event>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "worker connected");
                        tokio::spawn(run_connection(
                            stream,
                            sendq.clone(),
                            recvq.clone(),
                            cancel.child_token(),
                        ));
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "worker io: accept failed");
                    }
                }
            }
        }
    }
}

/// One worker connection: a sender half draining the send queue and a
/// reader half feeding the receive queue. Disconnect cancels both.
async fn run_connection(
    stream: TcpStream,
    sendq: EventQueue<Event>,
    recvq: EventQueue<Event>,
    cancel: CancellationToken,
) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(err) => {
            tracing::error!(error = %err, "worker io: handshake failed");
            return;
        }
    };

    let (sink, stream) = socket.split();
    let last_pong = Arc::new(Mutex::new(Instant::now()));

    let sender = tokio::spawn(run_sender(
        sink,
        sendq.clone(),
        Arc::clone(&last_pong),
        cancel.clone(),
    ));
    let reader = tokio::spawn(run_reader(stream, recvq, last_pong, cancel.clone()));

    let _ = reader.await;
    cancel.cancel();
    let _ = sender.await;
    tracing::debug!("worker disconnected");
}

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<TcpStream>,
    Message,
>;
type WsStream = futures_util::stream::SplitStream<tokio_tungstenite::WebSocketStream<TcpStream>>;

async fn run_sender(
    mut sink: WsSink,
    sendq: EventQueue<Event>,
    last_pong: Arc<Mutex<Instant>>,
    cancel: CancellationToken,
) {
    let mut events = sendq.subscribe();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }

            _ = ping.tick() => {
                if last_pong.lock().elapsed() > PING_INTERVAL + PONG_TIMEOUT {
                    tracing::warn!("worker io: pong timeout, dropping connection");
                    cancel.cancel();
                    return;
                }
                if sink.send(Message::Ping(ws::Bytes::new())).await.is_err() {
                    cancel.cancel();
                    return;
                }
            }

            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("worker io: send queue closed");
                    return;
                };

                let frame = match serde_json::to_string(&event) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::error!(error = %err, "worker io: failed to encode event");
                        continue;
                    }
                };

                if let Err(err) = sink.send(Message::text(frame)).await {
                    // hand the event back for whoever is connected once the
                    // retry delay passes; the reader half notices a dead
                    // socket and cancels us
                    tracing::error!(error = %err, "worker io: failed to send to worker");
                    let sendq = sendq.clone();
                    let requeue_cancel = cancel.clone();
                    tokio::spawn(async move {
                        publish_after(&requeue_cancel, REQUEUE_TIMEOUT, move || {
                            sendq.publish(event);
                        })
                        .await;
                    });
                }
            }
        }
    }
}

async fn run_reader(
    mut stream: WsStream,
    recvq: EventQueue<Event>,
    last_pong: Arc<Mutex<Instant>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            message = stream.next() => {
                let Some(Ok(message)) = message else {
                    cancel.cancel();
                    return;
                };

                match message {
                    Message::Text(text) => handle_frame(text.as_bytes(), &recvq),
                    Message::Binary(bytes) => handle_frame(&bytes, &recvq),
                    Message::Pong(_) => {
                        *last_pong.lock() = Instant::now();
                    }
                    Message::Close(_) => {
                        cancel.cancel();
                        return;
                    }
                    Message::Ping(_) | Message::Frame(_) => {}
                }
            }
        }
    }
}

/// Unknown tags and malformed payloads are logged and dropped; a worker
/// speaking a newer protocol must not wedge the gateway.
fn handle_frame(bytes: &[u8], recvq: &EventQueue<Event>) {
    match decode(bytes) {
        Ok(event) => recvq.publish(event),
        Err(err) => {
            tracing::error!(error = %err, "worker io: failed to decode worker message");
        }
    }
}

/// Run `publish` after `delay` unless cancelled first.
async fn publish_after(cancel: &CancellationToken, delay: Duration, publish: impl FnOnce()) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(delay) => publish(),
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
