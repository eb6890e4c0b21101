// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task factory and handle.

use crate::row::{Row, RowGuard};
use crate::store::Store;
use std::sync::Arc;
use wf_core::{JobId, Status, Step, Task, TaskId};

pub struct Tasks<'s> {
    pub(crate) store: &'s Store,
}

impl Tasks<'_> {
    pub fn get(&self, id: TaskId) -> Option<TaskHandle> {
        let row = self.store.inner.tasks.lock().get(&id).cloned()?;
        Some(TaskHandle { row })
    }

    /// Handles of a job's tasks in plan order.
    pub fn by_job(&self, job_id: JobId) -> Vec<TaskHandle> {
        let rows: Vec<Arc<Row<Task>>> = {
            let order = self.store.inner.tasks_by_job.lock();
            let map = self.store.inner.tasks.lock();
            order
                .get(&job_id)
                .into_iter()
                .flatten()
                .filter_map(|id| map.get(id).cloned())
                .collect()
        };
        rows.into_iter().map(|row| TaskHandle { row }).collect()
    }

    pub fn list_by_status(&self, status: Status) -> Vec<Task> {
        let rows: Vec<Arc<Row<Task>>> = self.store.inner.tasks.lock().values().cloned().collect();
        rows.iter()
            .map(|row| row.snapshot())
            .filter(|task| task.status == status)
            .collect()
    }
}

#[derive(Clone)]
pub struct TaskHandle {
    pub(crate) row: Arc<Row<Task>>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.row.snapshot().id
    }

    pub fn model(&self) -> Task {
        self.row.snapshot()
    }

    pub fn lock(&self) -> RowGuard<'_, Task> {
        self.row.lock()
    }
}

impl RowGuard<'_, Task> {
    /// Persist a new step config. Written before the pending transition so
    /// the worker command carries resolved container ids.
    pub fn update_step(&mut self, step: Step) {
        self.get_mut().step = step;
    }
}
