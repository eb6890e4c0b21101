// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job processor: reacts to `job:status`, `task:status`, `job:abort`.
//!
//! One layer below the build processor, with one addition: the task
//! scheduler threads an [`Outputs`] accumulator along the chain so the
//! container id produced by the init step reaches every later step before
//! it is scheduled.

use crate::error::{EngineError, NoopOnPrecondition};
use crate::watcher::EventProcessor;
use wf_core::{
    by_type, Clock, Event, EventFilter, EventKind, EventOrigin, Job, JobId, Outputs, Publisher,
    Status, Task, TaskPlan,
};
use wf_storage::Store;

pub struct JobProcessor<P, C> {
    store: Store,
    publisher: P,
    clock: C,
}

impl<P: Publisher, C: Clock> JobProcessor<P, C> {
    pub fn new(store: Store, publisher: P, clock: C) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    /// `job:status(pending)`: schedule the first task and start the job.
    fn job_status(&self, origin: &EventOrigin, status: Status) -> Result<(), EngineError> {
        if !status.is_pending() {
            return Ok(());
        }

        let id = JobId::from(origin.id);
        let Some(job) = self.store.jobs().get(id) else {
            return Err(EngineError::JobNotFound(id));
        };

        let mut guard = job.lock();
        if guard.status().is_started() || guard.status().is_finished() {
            return Ok(());
        }

        let plan = guard.get().plan.clone();
        let mut outputs = Outputs::default();
        self.schedule_next_task(&plan, &mut outputs)?;

        guard.start().noop_on_precondition()?;
        guard.commit();

        Ok(())
    }

    /// A terminal `task:status`: re-run the scheduler; when the task chain
    /// terminates, finish the job with the chain's outcome.
    fn task_status(&self, job_id: JobId, status: Status) -> Result<(), EngineError> {
        if !status.is_finished() {
            return Ok(());
        }

        let Some(job) = self.store.jobs().get(job_id) else {
            return Err(EngineError::JobNotFound(job_id));
        };

        let mut guard = job.lock();
        if guard.status().is_finished() {
            return Ok(());
        }

        let plan = guard.get().plan.clone();
        let mut outputs = Outputs::default();
        let outcome = self.schedule_next_task(&plan, &mut outputs)?;

        if outcome.is_finished() {
            guard.finish(outcome)?;
            self.publish_status_changed(guard.get())?;
        }
        guard.commit();

        Ok(())
    }

    /// `job:abort`: cascade `task:abort` to running tasks, then finish the
    /// job as aborted.
    fn job_abort(&self, origin: &EventOrigin) -> Result<(), EngineError> {
        let id = JobId::from(origin.id);
        let Some(job) = self.store.jobs().get(id) else {
            return Err(EngineError::JobNotFound(id));
        };

        let mut guard = job.lock();
        if guard.status().is_finished() {
            return Ok(());
        }

        for task in self.store.tasks().by_job(id) {
            let model = task.model();
            if model.status.is_running() {
                self.publisher.publish(Event::TaskAbort {
                    origin: EventOrigin::new(model.id, &self.clock),
                })?;
            }
        }

        guard.abort()?;
        self.publish_status_changed(guard.get())?;
        guard.commit();

        Ok(())
    }

    /// Walk the task chain, threading outputs left to right.
    ///
    /// The first created task gets the accumulated outputs written into its
    /// step config *before* the pending transition, so the worker command
    /// carries a resolved container id. Short-circuits on the first
    /// non-success terminal, which is why a failed script leaves the
    /// cleanup task in `created`.
    fn schedule_next_task(
        &self,
        plan: &TaskPlan,
        outputs: &mut Outputs,
    ) -> Result<Status, EngineError> {
        for node in plan.iter() {
            let Some(task) = self.store.tasks().get(node.node.id) else {
                return Err(EngineError::TaskNotFound(node.node.id));
            };

            let mut guard = task.lock();
            let status = guard.status();

            if status.is_created() {
                let mut step = guard.get().step.clone();
                outputs.apply(&mut step);
                guard.update_step(step);
                guard.pending()?;

                let model = guard.get().clone();
                self.publish_task_status_changed(&model)?;
                guard.commit();
                return Ok(Status::Pending);
            }

            if status.is_running() {
                return Ok(status);
            }

            if status.is_succeeded() {
                outputs.collect(&guard.get().step);
                continue;
            }

            return Ok(status);
        }

        Ok(Status::Succeeded)
    }

    fn publish_status_changed(&self, job: &Job) -> Result<(), EngineError> {
        self.publisher.publish(Event::JobStatus {
            origin: EventOrigin::new(job.id, &self.clock),
            status: job.status,
            build_id: job.build_id,
        })?;
        Ok(())
    }

    fn publish_task_status_changed(&self, task: &Task) -> Result<(), EngineError> {
        self.publisher.publish(Event::TaskStatus {
            origin: EventOrigin::new(task.id, &self.clock),
            status: task.status,
            job_id: task.job_id,
        })?;
        Ok(())
    }
}

impl<P: Publisher, C: Clock> EventProcessor for JobProcessor<P, C> {
    fn filters(&self) -> Vec<EventFilter> {
        vec![by_type([
            EventKind::JobStatus,
            EventKind::TaskStatus,
            EventKind::JobAbort,
        ])]
    }

    fn process_event(&self, event: &Event) -> Result<(), EngineError> {
        match event {
            Event::JobStatus { origin, status, .. } => self.job_status(origin, *status),
            Event::TaskStatus { status, job_id, .. } => self.task_status(*job_id, *status),
            Event::JobAbort { origin } => self.job_abort(origin),
            other => {
                tracing::error!(event = other.name(), "job processor: unexpected event");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
