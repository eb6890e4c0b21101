// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow factory and handle.

use crate::row::{Row, RowGuard};
use crate::store::Store;
use std::sync::Arc;
use wf_core::{BuildId, Workflow, WorkflowConfig, WorkflowId};

pub struct Workflows<'s> {
    pub(crate) store: &'s Store,
}

impl Workflows<'_> {
    pub fn insert(&self, workflow: Workflow) -> WorkflowHandle {
        let id = workflow.id;
        let row = Row::new(workflow);
        self.store.inner.workflows.lock().insert(id, Arc::clone(&row));
        self.store.inner.workflow_order.lock().push(id);
        WorkflowHandle { row }
    }

    pub fn get(&self, id: WorkflowId) -> Option<WorkflowHandle> {
        let row = self.store.inner.workflows.lock().get(&id).cloned()?;
        Some(WorkflowHandle { row })
    }

    /// Stable, insertion-ordered page of workflows.
    pub fn list(&self, offset: usize, limit: usize) -> Vec<Workflow> {
        let page: Vec<Arc<Row<Workflow>>> = {
            let order = self.store.inner.workflow_order.lock();
            let map = self.store.inner.workflows.lock();
            order
                .iter()
                .skip(offset)
                .take(limit)
                .filter_map(|id| map.get(id).cloned())
                .collect()
        };
        page.iter().map(|row| row.snapshot()).collect()
    }
}

#[derive(Clone)]
pub struct WorkflowHandle {
    pub(crate) row: Arc<Row<Workflow>>,
}

impl WorkflowHandle {
    pub fn id(&self) -> WorkflowId {
        self.row.snapshot().id
    }

    pub fn model(&self) -> Workflow {
        self.row.snapshot()
    }

    /// Acquire the workflow row lock.
    pub fn lock(&self) -> RowGuard<'_, Workflow> {
        self.row.lock()
    }

    /// Replace name and config. Running builds keep their snapshot.
    pub fn update(&self, name: String, config: WorkflowConfig) {
        let mut guard = self.lock();
        guard.get_mut().name = name;
        guard.get_mut().config = config;
        guard.commit();
    }

    pub fn curr_build_id(&self) -> Option<BuildId> {
        self.row.snapshot().curr_build_id
    }
}
