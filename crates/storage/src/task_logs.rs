// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task log append and paging.

use crate::store::Store;
use wf_core::{LogMessage, TaskId};

pub struct TaskLogs<'s> {
    pub(crate) store: &'s Store,
}

impl TaskLogs<'_> {
    /// Append a batch of messages atomically.
    pub fn save(&self, task_id: TaskId, messages: Vec<LogMessage>) {
        if messages.is_empty() {
            return;
        }
        self.store
            .inner
            .task_logs
            .lock()
            .entry(task_id)
            .or_default()
            .extend(messages);
    }

    /// Newest-first page of a task's logs.
    pub fn last_logs(&self, task_id: TaskId, offset: usize, limit: usize) -> Vec<LogMessage> {
        let logs = self.store.inner.task_logs.lock();
        logs.get(&task_id)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "task_logs_tests.rs"]
mod tests;
