// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-bucketed discard queue.
//!
//! Events published while no subscriber is attached are buffered with a
//! per-event deadline; a subscriber attaching before the deadline receives
//! them in publish order, expired entries go to the discard callback. The
//! worker gateway uses one of these on each side of the socket.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Capacity of each subscriber's channel.
const SUBSCRIBER_BUFFER: usize = 100;

/// Extra wait after a deadline so one timer wake collects a burst.
const BURST_BUFFER: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct EventQueue<T> {
    cmd_tx: mpsc::UnboundedSender<Cmd<T>>,
}

enum Cmd<T> {
    Publish(T),
    Subscribe(mpsc::Sender<T>),
    Shutdown,
}

impl<T: Clone + Send + 'static> EventQueue<T> {
    /// Must be called within a tokio runtime: the queue runs an actor task.
    pub fn new(discard_after: Duration, discard_fn: impl Fn(T) + Send + 'static) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(cmd_rx, discard_after, discard_fn));
        Self { cmd_tx }
    }

    /// Non-blocking publish. Silently dropped after shutdown.
    pub fn publish(&self, event: T) {
        let _ = self.cmd_tx.send(Cmd::Publish(event));
    }

    /// Attach a subscriber. Buffered events within the discard horizon are
    /// replayed in order before live delivery starts. Dropping the receiver
    /// detaches the subscriber.
    pub fn subscribe(&self) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let _ = self.cmd_tx.send(Cmd::Subscribe(tx));
        rx
    }

    /// Stop the actor; buffered events go to the discard callback.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
    }
}

async fn run<T: Clone>(
    mut cmd_rx: mpsc::UnboundedReceiver<Cmd<T>>,
    discard_after: Duration,
    discard_fn: impl Fn(T),
) {
    let mut discard_queue: VecDeque<(T, Instant)> = VecDeque::new();
    let mut subscribers: Vec<mpsc::Sender<T>> = Vec::new();

    loop {
        let wake_at = discard_queue.front().map(|(_, at)| *at + BURST_BUFFER);

        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                None | Some(Cmd::Shutdown) => {
                    for (event, _) in discard_queue {
                        discard_fn(event);
                    }
                    return;
                }

                Some(Cmd::Publish(event)) => {
                    if !subscribers.is_empty() {
                        let mut active = Vec::with_capacity(subscribers.len());
                        for tx in subscribers.drain(..) {
                            if tx.send(event.clone()).await.is_ok() {
                                active.push(tx);
                            }
                        }
                        subscribers = active;
                    }
                    if subscribers.is_empty() {
                        discard_queue.push_back((event, Instant::now() + discard_after));
                    }
                }

                Some(Cmd::Subscribe(tx)) => {
                    let mut closed = false;
                    while let Some((event, _)) = discard_queue.pop_front() {
                        if tx.send(event).await.is_err() {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        subscribers.push(tx);
                    }
                }
            },

            // wake_at is always Some when this branch is enabled
            _ = tokio::time::sleep_until(wake_at.unwrap_or_else(Instant::now)),
                if wake_at.is_some() =>
            {
                let now = Instant::now();
                while let Some((_, at)) = discard_queue.front() {
                    if now < *at {
                        break;
                    }
                    if let Some((event, _)) = discard_queue.pop_front() {
                        discard_fn(event);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "eventq_tests.rs"]
mod tests;
