// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event bus.
//!
//! Publish is non-blocking: each subscriber owns a bounded channel, and
//! overflow lands in the subscriber's deadline-keyed pending queue, drained
//! in order by a per-subscriber flusher task. Entries older than the discard
//! horizon go to the subscription's discard callback instead of the stream.
//! A slow subscriber therefore never stalls publishers or its peers, and a
//! single publisher's events reach a given subscriber in publish order.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::time::Instant;
use wf_core::{Event, EventFilter, PublishError, Publisher};

/// Capacity of each subscriber's delivery channel.
const SUBSCRIBER_BUFFER: usize = 128;

/// How long an overflowed event stays deliverable.
const DISCARD_AFTER: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("event bus closed")]
    Closed,
}

#[derive(Clone, Default)]
pub struct Bus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    subscribers: Mutex<Vec<Arc<BusSubscriber>>>,
    closed: AtomicBool,
}

type DiscardFn = Box<dyn Fn(Event) + Send + Sync>;

struct BusSubscriber {
    filters: Vec<EventFilter>,
    tx: Mutex<Option<mpsc::Sender<Event>>>,
    pending: Mutex<VecDeque<(Event, Instant)>>,
    notify: Notify,
    closed: AtomicBool,
    discard: DiscardFn,
    errors: Mutex<Option<oneshot::Sender<BusError>>>,
}

impl BusSubscriber {
    /// A filter that panics is treated as non-matching; the subscriber
    /// stays up.
    fn matches(&self, event: &Event) -> bool {
        catch_unwind(AssertUnwindSafe(|| {
            self.filters.iter().all(|filter| filter(event))
        }))
        .unwrap_or(false)
    }

    fn sender(&self) -> Option<mpsc::Sender<Event>> {
        self.tx.lock().clone()
    }

    fn deliver(&self, event: Event) {
        let Some(tx) = self.sender() else {
            return;
        };

        let mut pending = self.pending.lock();
        if pending.is_empty() {
            match tx.try_send(event) {
                Ok(()) => return,
                Err(mpsc::error::TrySendError::Full(event)) => {
                    pending.push_back((event, Instant::now() + DISCARD_AFTER));
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.closed.store(true, Ordering::SeqCst);
                    return;
                }
            }
        } else {
            // Keep delivery order: once anything is pending, everything
            // later queues behind it.
            pending.push_back((event, Instant::now() + DISCARD_AFTER));
        }
        drop(pending);
        self.notify.notify_one();
    }

    fn close(&self, error: Option<BusError>) {
        self.closed.store(true, Ordering::SeqCst);
        *self.tx.lock() = None;
        if let (Some(errors), Some(error)) = (self.errors.lock().take(), error) {
            let _ = errors.send(error);
        }
        self.notify.notify_one();
    }
}

/// Event stream handed to a subscriber, plus its error channel and closer.
pub struct Subscription {
    pub events: mpsc::Receiver<Event>,
    pub errors: oneshot::Receiver<BusError>,
    pub closer: SubscriptionCloser,
}

/// Releases the subscription's bus resources. Also closed on drop.
pub struct SubscriptionCloser {
    subscriber: Arc<BusSubscriber>,
    bus: Arc<BusInner>,
}

impl SubscriptionCloser {
    pub fn close(&self) {
        self.subscriber.close(None);
        self.bus
            .subscribers
            .lock()
            .retain(|sub| !Arc::ptr_eq(sub, &self.subscriber));
    }
}

impl Drop for SubscriptionCloser {
    fn drop(&mut self) {
        self.close();
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe with the conjunction of `filters`. Overflowed events past
    /// the discard horizon are dropped silently.
    ///
    /// Must be called within a tokio runtime: each subscription runs a
    /// flusher task.
    pub fn subscribe(&self, filters: Vec<EventFilter>) -> Subscription {
        self.subscribe_with_discard(filters, |event| {
            tracing::debug!(event = event.name(), "discarding undelivered event");
        })
    }

    /// Subscribe with a caller-supplied discard callback for events that
    /// exceed the discard horizon.
    pub fn subscribe_with_discard(
        &self,
        filters: Vec<EventFilter>,
        discard: impl Fn(Event) + Send + Sync + 'static,
    ) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let (errors_tx, errors_rx) = oneshot::channel();

        let subscriber = Arc::new(BusSubscriber {
            filters,
            tx: Mutex::new(Some(tx)),
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            discard: Box::new(discard),
            errors: Mutex::new(Some(errors_tx)),
        });

        if self.inner.closed.load(Ordering::SeqCst) {
            subscriber.close(Some(BusError::Closed));
        } else {
            self.inner.subscribers.lock().push(Arc::clone(&subscriber));
            tokio::spawn(run_flusher(Arc::clone(&subscriber)));
        }

        Subscription {
            events: rx,
            errors: errors_rx,
            closer: SubscriptionCloser {
                subscriber,
                bus: Arc::clone(&self.inner),
            },
        }
    }

    /// Shut the bus down. Subscribers get `BusError::Closed` on their error
    /// channel and their event streams end after draining.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let subscribers: Vec<Arc<BusSubscriber>> =
            std::mem::take(&mut *self.inner.subscribers.lock());
        for subscriber in subscribers {
            subscriber.close(Some(BusError::Closed));
        }
    }
}

impl Publisher for Bus {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(PublishError);
        }

        let subscribers: Vec<Arc<BusSubscriber>> =
            self.inner.subscribers.lock().iter().cloned().collect();

        tracing::trace!(event = event.name(), "event published");

        for subscriber in subscribers {
            if subscriber.closed.load(Ordering::SeqCst) {
                continue;
            }
            if !subscriber.matches(&event) {
                continue;
            }
            subscriber.deliver(event.clone());
        }

        Ok(())
    }
}

/// Drains a subscriber's pending queue into its channel, discarding entries
/// that age out while waiting for capacity.
async fn run_flusher(subscriber: Arc<BusSubscriber>) {
    loop {
        let front = {
            let pending = subscriber.pending.lock();
            pending.front().map(|(event, deadline)| (event.clone(), *deadline))
        };

        let Some((event, deadline)) = front else {
            if subscriber.closed.load(Ordering::SeqCst) {
                return;
            }
            subscriber.notify.notified().await;
            continue;
        };

        let Some(tx) = subscriber.sender() else {
            drain_discarded(&subscriber);
            return;
        };

        let outcome = tokio::time::timeout_at(deadline, tx.reserve()).await;
        match outcome {
            Ok(Ok(permit)) => {
                permit.send(event);
                subscriber.pending.lock().pop_front();
            }
            Ok(Err(_)) => {
                // receiver dropped
                subscriber.closed.store(true, Ordering::SeqCst);
                drain_discarded(&subscriber);
                return;
            }
            Err(_) => {
                subscriber.pending.lock().pop_front();
                (subscriber.discard)(event);
            }
        }
    }
}

fn drain_discarded(subscriber: &BusSubscriber) {
    let drained: Vec<(Event, Instant)> = subscriber.pending.lock().drain(..).collect();
    for (event, _) in drained {
        (subscriber.discard)(event);
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
