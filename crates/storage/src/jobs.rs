// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job factory and handle.

use crate::row::{Row, RowGuard};
use crate::store::Store;
use std::sync::Arc;
use wf_core::{BuildId, Job, JobId, Status};

pub struct Jobs<'s> {
    pub(crate) store: &'s Store,
}

impl Jobs<'_> {
    pub fn get(&self, id: JobId) -> Option<JobHandle> {
        let row = self.store.inner.jobs.lock().get(&id).cloned()?;
        Some(JobHandle { row })
    }

    /// Handles of a build's jobs in plan order.
    pub fn by_build(&self, build_id: BuildId) -> Vec<JobHandle> {
        let rows: Vec<Arc<Row<Job>>> = {
            let order = self.store.inner.jobs_by_build.lock();
            let map = self.store.inner.jobs.lock();
            order
                .get(&build_id)
                .into_iter()
                .flatten()
                .filter_map(|id| map.get(id).cloned())
                .collect()
        };
        rows.into_iter().map(|row| JobHandle { row }).collect()
    }

    pub fn list_by_status(&self, status: Status) -> Vec<Job> {
        let rows: Vec<Arc<Row<Job>>> = self.store.inner.jobs.lock().values().cloned().collect();
        rows.iter()
            .map(|row| row.snapshot())
            .filter(|job| job.status == status)
            .collect()
    }
}

#[derive(Clone)]
pub struct JobHandle {
    pub(crate) row: Arc<Row<Job>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.row.snapshot().id
    }

    pub fn model(&self) -> Job {
        self.row.snapshot()
    }

    pub fn lock(&self) -> RowGuard<'_, Job> {
        self.row.lock()
    }
}
