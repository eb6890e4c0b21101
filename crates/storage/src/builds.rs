// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build factory and handle.

use crate::row::{Row, RowGuard};
use crate::store::Store;
use std::sync::Arc;
use wf_core::{Build, BuildId, Status, WorkflowId};

pub struct Builds<'s> {
    pub(crate) store: &'s Store,
}

impl Builds<'_> {
    pub fn get(&self, id: BuildId) -> Option<BuildHandle> {
        let row = self.store.inner.builds.lock().get(&id).cloned()?;
        Some(BuildHandle { row })
    }

    pub fn by_workflow(&self, workflow_id: WorkflowId) -> Vec<Build> {
        let rows: Vec<Arc<Row<Build>>> = {
            let order = self.store.inner.builds_by_workflow.lock();
            let map = self.store.inner.builds.lock();
            order
                .get(&workflow_id)
                .into_iter()
                .flatten()
                .filter_map(|id| map.get(id).cloned())
                .collect()
        };
        rows.iter().map(|row| row.snapshot()).collect()
    }

    pub fn list_by_status(&self, status: Status) -> Vec<Build> {
        let rows: Vec<Arc<Row<Build>>> =
            self.store.inner.builds.lock().values().cloned().collect();
        rows.iter()
            .map(|row| row.snapshot())
            .filter(|build| build.status == status)
            .collect()
    }
}

#[derive(Clone)]
pub struct BuildHandle {
    pub(crate) row: Arc<Row<Build>>,
}

impl BuildHandle {
    pub fn id(&self) -> BuildId {
        self.row.snapshot().id
    }

    pub fn model(&self) -> Build {
        self.row.snapshot()
    }

    /// Acquire the build row lock (`SELECT … FOR UPDATE` equivalent).
    pub fn lock(&self) -> RowGuard<'_, Build> {
        self.row.lock()
    }
}
