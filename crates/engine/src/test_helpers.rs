// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for processor tests: a capturing publisher and a
//! miniature synchronous dispatch loop standing in for the bus.

use crate::planner::Planner;
use crate::processor::{BuildProcessor, JobProcessor, TaskProcessor};
use crate::watcher::EventProcessor;
use parking_lot::Mutex;
use std::cell::Cell;
use std::sync::Arc;
use wf_core::test_support::{workflow, workflow_config};
use wf_core::{BuildId, Event, FakeClock, JobId, PublishError, Publisher, Status, TaskId};
use wf_storage::{Store, WorkflowHandle};

/// Publisher that records everything; the dispatch loop replays it.
#[derive(Clone, Default)]
pub(crate) struct CapturePublisher {
    events: Arc<Mutex<Vec<Event>>>,
}

impl CapturePublisher {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl Publisher for CapturePublisher {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        self.events.lock().push(event);
        Ok(())
    }
}

pub(crate) struct TestEngine {
    pub store: Store,
    pub publisher: CapturePublisher,
    pub clock: FakeClock,
    processors: Vec<Arc<dyn EventProcessor>>,
    cursor: Cell<usize>,
}

impl TestEngine {
    pub fn new() -> Self {
        let store = Store::new();
        let publisher = CapturePublisher::default();
        let clock = FakeClock::new();

        let processors: Vec<Arc<dyn EventProcessor>> = vec![
            Arc::new(BuildProcessor::new(
                store.clone(),
                publisher.clone(),
                clock.clone(),
            )),
            Arc::new(JobProcessor::new(
                store.clone(),
                publisher.clone(),
                clock.clone(),
            )),
            Arc::new(TaskProcessor::new(
                store.clone(),
                publisher.clone(),
                clock.clone(),
            )),
        ];

        Self {
            store,
            publisher,
            clock,
            processors,
            cursor: Cell::new(0),
        }
    }

    /// Plan a workflow with the given shape and insert all rows.
    pub fn seed(&self, jobs: usize, scripts: usize) -> (WorkflowHandle, BuildId) {
        let handle = self
            .store
            .workflows()
            .insert(workflow("wf", workflow_config(jobs, scripts)));
        let output = Planner::new().plan(&handle.model()).unwrap();
        let build_id = output.build.id;
        self.store
            .insert_plan(&handle, output.build, output.jobs, output.tasks)
            .unwrap();
        (handle, build_id)
    }

    /// Put an event on the "bus" and pump deliveries until quiescent.
    pub fn publish(&self, event: Event) {
        self.publisher.publish(event).unwrap();
        self.drain();
    }

    /// Deliver captured events to every matching processor, in capture
    /// order, until nothing new is published.
    pub fn drain(&self) {
        loop {
            let i = self.cursor.get();
            let event = {
                let events = self.publisher.events.lock();
                match events.get(i) {
                    Some(event) => event.clone(),
                    None => break,
                }
            };
            self.cursor.set(i + 1);

            for processor in &self.processors {
                if processor.filters().iter().all(|filter| filter(&event)) {
                    // handler errors are logged no-ops, as in the watcher
                    let _ = processor.process_event(&event);
                }
            }
        }
    }

    /// Start the seeded build the way the API does: publish
    /// `build:status(pending)`.
    pub fn start_build(&self, handle: &WorkflowHandle, build_id: BuildId) {
        self.publish(Event::BuildStatus {
            origin: wf_core::EventOrigin::new(build_id, &self.clock),
            status: Status::Pending,
            workflow_id: handle.id(),
        });
    }

    pub fn build_status(&self, id: BuildId) -> Status {
        self.store.builds().get(id).unwrap().model().status
    }

    pub fn job_ids(&self, build_id: BuildId) -> Vec<JobId> {
        self.store
            .jobs()
            .by_build(build_id)
            .iter()
            .map(|job| job.id())
            .collect()
    }

    pub fn job_status(&self, id: JobId) -> Status {
        self.store.jobs().get(id).unwrap().model().status
    }

    pub fn task_ids(&self, job_id: JobId) -> Vec<TaskId> {
        self.store
            .tasks()
            .by_job(job_id)
            .iter()
            .map(|task| task.id())
            .collect()
    }

    pub fn task_status(&self, id: TaskId) -> Status {
        self.store.tasks().get(id).unwrap().model().status
    }

    /// Kinds of the worker-bound commands captured so far, in order.
    pub fn outbound(&self) -> Vec<&'static str> {
        self.publisher
            .events()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::InitContainerStart { .. }
                        | Event::ScriptStart { .. }
                        | Event::ScriptAbort { .. }
                        | Event::CleanupContainer { .. }
                )
            })
            .map(Event::name)
            .collect()
    }
}
