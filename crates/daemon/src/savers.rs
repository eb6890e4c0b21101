// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence watchers: every event into the event store, task logs into
//! the log store. Both run in sync watchers so persistence stays causally
//! ordered relative to bus delivery.

use wf_core::{by_type, Event, EventFilter, EventKind, TaskId};
use wf_engine::{EngineError, EventProcessor};
use wf_storage::Store;

/// Appends every event to the event store.
pub struct EventSaver {
    store: Store,
}

impl EventSaver {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl EventProcessor for EventSaver {
    fn filters(&self) -> Vec<EventFilter> {
        Vec::new()
    }

    fn process_event(&self, event: &Event) -> Result<(), EngineError> {
        self.store.events().save(event);
        Ok(())
    }
}

/// Batches `task:log` messages into the task log store.
pub struct LogSaver {
    store: Store,
}

impl LogSaver {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl EventProcessor for LogSaver {
    fn filters(&self) -> Vec<EventFilter> {
        vec![by_type([EventKind::TaskLog])]
    }

    fn process_event(&self, event: &Event) -> Result<(), EngineError> {
        let Event::TaskLog { origin, messages } = event else {
            return Ok(());
        };
        self.store
            .task_logs()
            .save(TaskId::from(origin.id), messages.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "savers_tests.rs"]
mod tests;
