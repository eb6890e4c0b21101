// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher: drives an event processor from a bus subscription.

use crate::bus::Bus;
use crate::error::EngineError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wf_core::{Event, EventFilter};

/// A bus subscriber with a filter set and a per-event handler.
pub trait EventProcessor: Send + Sync {
    fn filters(&self) -> Vec<EventFilter>;
    fn process_event(&self, event: &Event) -> Result<(), EngineError>;
}

/// How a watcher runs its processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processing {
    /// One event at a time, in delivery order. Required for the state
    /// machine processors: serial handling plus row locks is what
    /// linearizes concurrent terminal events.
    Sync,
    /// One task per event.
    Spawn,
}

pub struct Watcher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Watcher {
    /// Subscribe `processor` to the bus and process serially.
    pub fn spawn(bus: &Bus, processor: Arc<dyn EventProcessor>) -> Self {
        Self::spawn_with(bus, processor, Processing::Sync)
    }

    pub fn spawn_with(bus: &Bus, processor: Arc<dyn EventProcessor>, mode: Processing) -> Self {
        let subscription = bus.subscribe(processor.filters());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(watch(subscription, processor, mode, cancel.clone()));
        Self { cancel, handle }
    }

    /// Cancel the watcher and wait for the in-flight event to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn watch(
    mut subscription: crate::bus::Subscription,
    processor: Arc<dyn EventProcessor>,
    mode: Processing,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            event = subscription.events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("watcher: event stream closed");
                    break;
                };

                match mode {
                    Processing::Sync => process(processor.as_ref(), &event),
                    Processing::Spawn => {
                        let processor = Arc::clone(&processor);
                        tokio::spawn(async move {
                            process(processor.as_ref(), &event);
                        });
                    }
                }
            }
        }
    }

    if let Ok(err) = subscription.errors.try_recv() {
        tracing::error!(error = %err, "watcher: bus terminated with error");
    }
}

/// Handler errors never terminate the subscriber; they are logged and the
/// next event is processed.
fn process(processor: &dyn EventProcessor, event: &Event) {
    if let Err(err) = processor.process_event(event) {
        tracing::error!(event = event.name(), error = %err, "watcher: failed to process event");
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
