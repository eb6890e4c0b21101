// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event history: append-only, keyed by `(origin_id, occurred_at, tag)`.

use crate::store::Store;
use chrono::{DateTime, Utc};
use wf_core::{Event, EventKind, OriginId};

#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub origin_id: OriginId,
    pub occurred_at: DateTime<Utc>,
    pub tag: &'static str,
    pub payload: serde_json::Value,
}

pub struct Events<'s> {
    pub(crate) store: &'s Store,
}

impl Events<'_> {
    pub fn save(&self, event: &Event) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(event = event.name(), error = %err, "failed to serialize event");
                return;
            }
        };

        let origin = event.origin();
        self.store.inner.events.lock().push(StoredEvent {
            origin_id: origin.id,
            occurred_at: origin.occurred_at,
            tag: event.name(),
            payload,
        });
    }

    /// All stored events for an origin, oldest first.
    pub fn events(&self, origin_id: OriginId) -> Vec<Event> {
        self.decode(origin_id, None)
    }

    pub fn events_by_type(&self, origin_id: OriginId, kind: EventKind) -> Vec<Event> {
        self.decode(origin_id, Some(kind))
    }

    fn decode(&self, origin_id: OriginId, kind: Option<EventKind>) -> Vec<Event> {
        let stored: Vec<StoredEvent> = self
            .store
            .inner
            .events
            .lock()
            .iter()
            .filter(|event| event.origin_id == origin_id)
            .filter(|event| kind.is_none_or(|k| event.tag == k.tag()))
            .cloned()
            .collect();

        stored
            .into_iter()
            .filter_map(|event| match serde_json::from_value(event.payload) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    tracing::warn!(tag = event.tag, error = %err, "undecodable stored event");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
