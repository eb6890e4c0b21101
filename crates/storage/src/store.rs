// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store: one table per aggregate plus child-order indexes.
//!
//! Table mutexes guard the maps only. Nothing takes a row lock while holding
//! a table lock — factories clone the row `Arc` out first — so the only lock
//! ordering that matters is Build → Job → Task, which the processors follow.

use crate::builds::Builds;
use crate::error::StorageError;
use crate::events::{Events, StoredEvent};
use crate::jobs::Jobs;
use crate::row::Row;
use crate::task_logs::TaskLogs;
use crate::tasks::Tasks;
use crate::workflows::{WorkflowHandle, Workflows};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use wf_core::{Build, BuildId, Job, JobId, LogMessage, Task, TaskId, Workflow, WorkflowId};

#[derive(Clone, Default)]
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

#[derive(Default)]
pub(crate) struct StoreInner {
    pub(crate) workflows: Mutex<HashMap<WorkflowId, Arc<Row<Workflow>>>>,
    pub(crate) workflow_order: Mutex<Vec<WorkflowId>>,
    pub(crate) builds: Mutex<HashMap<BuildId, Arc<Row<Build>>>>,
    pub(crate) builds_by_workflow: Mutex<HashMap<WorkflowId, Vec<BuildId>>>,
    pub(crate) jobs: Mutex<HashMap<JobId, Arc<Row<Job>>>>,
    pub(crate) jobs_by_build: Mutex<HashMap<BuildId, Vec<JobId>>>,
    pub(crate) tasks: Mutex<HashMap<TaskId, Arc<Row<Task>>>>,
    pub(crate) tasks_by_job: Mutex<HashMap<JobId, Vec<TaskId>>>,
    pub(crate) task_logs: Mutex<HashMap<TaskId, Vec<LogMessage>>>,
    pub(crate) events: Mutex<Vec<StoredEvent>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflows(&self) -> Workflows<'_> {
        Workflows { store: self }
    }

    pub fn builds(&self) -> Builds<'_> {
        Builds { store: self }
    }

    pub fn jobs(&self) -> Jobs<'_> {
        Jobs { store: self }
    }

    pub fn tasks(&self) -> Tasks<'_> {
        Tasks { store: self }
    }

    pub fn task_logs(&self) -> TaskLogs<'_> {
        TaskLogs { store: self }
    }

    pub fn events(&self) -> Events<'_> {
        Events { store: self }
    }

    /// Atomically insert a planned build with all of its jobs and tasks and
    /// point the workflow at the new build.
    ///
    /// Performed under the workflow row lock; rejected with `AlreadyRunning`
    /// while the workflow's current build is not finished, which is what
    /// keeps at most one build of a workflow active.
    pub fn insert_plan(
        &self,
        workflow: &WorkflowHandle,
        build: Build,
        jobs: Vec<Job>,
        tasks: Vec<Task>,
    ) -> Result<(), StorageError> {
        let mut guard = workflow.lock();

        if let Some(curr) = guard.get().curr_build_id {
            let running = self
                .builds()
                .get(curr)
                .is_some_and(|b| !b.model().status.is_finished());
            if running {
                return Err(StorageError::AlreadyRunning);
            }
        }

        let workflow_id = guard.get().id;
        let build_id = build.id;

        self.inner
            .builds_by_workflow
            .lock()
            .entry(workflow_id)
            .or_default()
            .push(build_id);
        self.inner.builds.lock().insert(build_id, Row::new(build));

        for job in jobs {
            self.inner
                .jobs_by_build
                .lock()
                .entry(job.build_id)
                .or_default()
                .push(job.id);
            self.inner.jobs.lock().insert(job.id, Row::new(job));
        }

        for task in tasks {
            self.inner
                .tasks_by_job
                .lock()
                .entry(task.job_id)
                .or_default()
                .push(task.id);
            self.inner.tasks.lock().insert(task.id, Row::new(task));
        }

        guard.get_mut().curr_build_id = Some(build_id);
        guard.commit();

        Ok(())
    }

    /// Delete a workflow and cascade to its whole history.
    ///
    /// Refused while the current build is still running.
    pub fn delete_workflow(&self, workflow: &WorkflowHandle) -> Result<(), StorageError> {
        let guard = workflow.lock();

        if let Some(curr) = guard.get().curr_build_id {
            let running = self
                .builds()
                .get(curr)
                .is_some_and(|b| !b.model().status.is_finished());
            if running {
                return Err(StorageError::AlreadyRunning);
            }
        }

        let workflow_id = guard.get().id;
        let build_ids = self
            .inner
            .builds_by_workflow
            .lock()
            .remove(&workflow_id)
            .unwrap_or_default();

        let mut origin_ids: Vec<wf_core::OriginId> = vec![workflow_id.into()];

        for build_id in &build_ids {
            origin_ids.push((*build_id).into());
            self.inner.builds.lock().remove(build_id);

            let job_ids = self
                .inner
                .jobs_by_build
                .lock()
                .remove(build_id)
                .unwrap_or_default();
            for job_id in &job_ids {
                origin_ids.push((*job_id).into());
                self.inner.jobs.lock().remove(job_id);

                let task_ids = self
                    .inner
                    .tasks_by_job
                    .lock()
                    .remove(job_id)
                    .unwrap_or_default();
                for task_id in &task_ids {
                    origin_ids.push((*task_id).into());
                    self.inner.tasks.lock().remove(task_id);
                    self.inner.task_logs.lock().remove(task_id);
                }
            }
        }

        self.inner
            .events
            .lock()
            .retain(|event| !origin_ids.contains(&event.origin_id));

        self.inner.workflows.lock().remove(&workflow_id);
        self.inner.workflow_order.lock().retain(|id| *id != workflow_id);
        guard.commit();

        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
