// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build processor: reacts to `build:status`, `job:status`, `build:abort`.

use crate::error::{EngineError, NoopOnPrecondition};
use crate::watcher::EventProcessor;
use wf_core::{
    by_type, Build, BuildId, Clock, Event, EventFilter, EventKind, EventOrigin, Job, JobPlan,
    Publisher, Status,
};
use wf_storage::Store;

pub struct BuildProcessor<P, C> {
    store: Store,
    publisher: P,
    clock: C,
}

impl<P: Publisher, C: Clock> BuildProcessor<P, C> {
    pub fn new(store: Store, publisher: P, clock: C) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    /// `build:status(pending)`: schedule the first job and start the build.
    fn build_status(&self, origin: &EventOrigin, status: Status) -> Result<(), EngineError> {
        if !status.is_pending() {
            return Ok(());
        }

        let id = BuildId::from(origin.id);
        let Some(build) = self.store.builds().get(id) else {
            return Err(EngineError::BuildNotFound(id));
        };

        let mut guard = build.lock();
        if guard.status().is_started() || guard.status().is_finished() {
            return Ok(());
        }

        let plan = guard.get().plan.clone();
        self.schedule_next_job(&plan)?;

        guard.start().noop_on_precondition()?;
        guard.commit();

        Ok(())
    }

    /// A terminal `job:status`: re-run the scheduler; when the job chain
    /// terminates, finish the build with the chain's outcome.
    fn job_status(&self, build_id: BuildId, status: Status) -> Result<(), EngineError> {
        if !status.is_finished() {
            return Ok(());
        }

        let Some(build) = self.store.builds().get(build_id) else {
            return Err(EngineError::BuildNotFound(build_id));
        };

        let mut guard = build.lock();
        if guard.status().is_finished() {
            // a concurrent terminal event already advanced the build
            return Ok(());
        }

        let plan = guard.get().plan.clone();
        let outcome = self.schedule_next_job(&plan)?;

        if outcome.is_finished() {
            guard.finish(outcome)?;
            self.publish_status_changed(guard.get())?;
        }
        guard.commit();

        Ok(())
    }

    /// `build:abort`: cascade `job:abort` to running jobs, then finish the
    /// build as aborted.
    fn build_abort(&self, origin: &EventOrigin) -> Result<(), EngineError> {
        let id = BuildId::from(origin.id);
        let Some(build) = self.store.builds().get(id) else {
            return Err(EngineError::BuildNotFound(id));
        };

        let mut guard = build.lock();
        if guard.status().is_finished() {
            return Ok(());
        }

        for job in self.store.jobs().by_build(id) {
            let model = job.model();
            if model.status.is_running() {
                self.publisher.publish(Event::JobAbort {
                    origin: EventOrigin::new(model.id, &self.clock),
                })?;
            }
        }

        guard.abort()?;
        self.publish_status_changed(guard.get())?;
        guard.commit();

        Ok(())
    }

    /// Walk the job chain: schedule the first created job, short-circuit on
    /// the first non-success terminal, report `succeeded` when the chain is
    /// exhausted.
    fn schedule_next_job(&self, plan: &JobPlan) -> Result<Status, EngineError> {
        for node in plan.iter() {
            let Some(job) = self.store.jobs().get(node.node.id) else {
                return Err(EngineError::JobNotFound(node.node.id));
            };

            let mut guard = job.lock();
            let status = guard.status();

            if status.is_created() {
                guard.pending()?;
                let model = guard.get().clone();
                self.publish_job_status_changed(&model)?;
                guard.commit();
                return Ok(Status::Pending);
            }

            if status.is_running() {
                return Ok(status);
            }

            if status.is_succeeded() {
                continue;
            }

            // failed / errored / aborted / skipped: the build inherits it
            return Ok(status);
        }

        Ok(Status::Succeeded)
    }

    fn publish_status_changed(&self, build: &Build) -> Result<(), EngineError> {
        self.publisher.publish(Event::BuildStatus {
            origin: EventOrigin::new(build.id, &self.clock),
            status: build.status,
            workflow_id: build.workflow_id,
        })?;
        Ok(())
    }

    fn publish_job_status_changed(&self, job: &Job) -> Result<(), EngineError> {
        self.publisher.publish(Event::JobStatus {
            origin: EventOrigin::new(job.id, &self.clock),
            status: job.status,
            build_id: job.build_id,
        })?;
        Ok(())
    }
}

impl<P: Publisher, C: Clock> EventProcessor for BuildProcessor<P, C> {
    fn filters(&self) -> Vec<EventFilter> {
        vec![by_type([
            EventKind::BuildStatus,
            EventKind::JobStatus,
            EventKind::BuildAbort,
        ])]
    }

    fn process_event(&self, event: &Event) -> Result<(), EngineError> {
        match event {
            Event::BuildStatus { origin, status, .. } => self.build_status(origin, *status),
            Event::JobStatus {
                status, build_id, ..
            } => self.job_status(*build_id, *status),
            Event::BuildAbort { origin } => self.build_abort(origin),
            other => {
                tracing::error!(event = other.name(), "build processor: unexpected event");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
