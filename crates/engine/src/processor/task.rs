// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task processor: the boundary between the state machines and the worker.
//!
//! Translates pending tasks into worker-bound commands and finalizes tasks
//! from worker results. Cleanup is fire-and-forget: the command goes out and
//! the task succeeds immediately, so a worker that lost the container does
//! not wedge the chain.

use crate::error::EngineError;
use crate::watcher::EventProcessor;
use wf_core::{
    by_type, Clock, ContainerSpec, Event, EventFilter, EventKind, EventOrigin, InitOutputs,
    Publisher, ScriptOutputs, ScriptSpec, Status, Step, Task, TaskId,
};
use wf_storage::Store;

pub struct TaskProcessor<P, C> {
    store: Store,
    publisher: P,
    clock: C,
}

impl<P: Publisher, C: Clock> TaskProcessor<P, C> {
    pub fn new(store: Store, publisher: P, clock: C) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    /// `task:status(pending)`: emit the worker command for the step and move
    /// the task to `started` (or straight to `succeeded` for cleanup).
    fn task_status(&self, origin: &EventOrigin, status: Status) -> Result<(), EngineError> {
        if !status.is_pending() {
            return Ok(());
        }

        let id = TaskId::from(origin.id);
        let Some(task) = self.store.tasks().get(id) else {
            return Err(EngineError::TaskNotFound(id));
        };

        let mut guard = task.lock();
        if !guard.status().is_pending() {
            // duplicate delivery after the task moved on
            return Ok(());
        }

        let (command, next_status) = self.start_command(guard.get());

        match next_status {
            Status::Succeeded => guard.finish(Status::Succeeded)?,
            _ => guard.start()?,
        }

        self.publisher.publish(command)?;
        self.publish_status_changed(guard.get())?;
        guard.commit();

        Ok(())
    }

    /// The outbound command for a step, and the status the task assumes
    /// once the command is out.
    fn start_command(&self, task: &Task) -> (Event, Status) {
        let origin = EventOrigin::new(task.id, &self.clock);

        match &task.step {
            Step::Init {
                image, cwd, env, ..
            } => (
                Event::InitContainerStart {
                    origin,
                    config: ContainerSpec {
                        image: image.clone(),
                        cwd: cwd.clone(),
                        env: env.clone(),
                    },
                },
                Status::Started,
            ),

            Step::Script {
                container_id,
                command,
                args,
                ..
            } => (
                Event::ScriptStart {
                    origin,
                    config: ScriptSpec {
                        container_id: container_id.clone(),
                        command: command.clone(),
                        args: args.clone(),
                    },
                },
                Status::Started,
            ),

            Step::Cleanup { container_id, .. } => (
                Event::CleanupContainer {
                    origin,
                    container_id: container_id.clone(),
                },
                Status::Succeeded,
            ),
        }
    }

    /// `init:container:finish`: record the container id and succeed.
    fn init_container_finish(
        &self,
        origin: &EventOrigin,
        container_id: &str,
    ) -> Result<(), EngineError> {
        let id = TaskId::from(origin.id);
        let Some(task) = self.store.tasks().get(id) else {
            return Err(EngineError::TaskNotFound(id));
        };

        let mut guard = task.lock();
        if guard.status().is_finished() {
            return Ok(());
        }

        let Step::Init {
            name,
            image,
            cwd,
            env,
            ..
        } = guard.get().step.clone()
        else {
            tracing::warn!(task = %id, "init finish for a non-init step");
            return Ok(());
        };

        guard.update_step(Step::Init {
            name,
            image,
            cwd,
            env,
            outputs: Some(InitOutputs {
                container_id: container_id.to_string(),
            }),
        });
        guard.finish(Status::Succeeded)?;
        self.publish_status_changed(guard.get())?;
        guard.commit();

        Ok(())
    }

    /// `script:finish`: record the outcome. Success is derived from the
    /// exit status, not the flag the worker happened to set.
    fn script_finish(&self, origin: &EventOrigin, exit_status: i32) -> Result<(), EngineError> {
        let id = TaskId::from(origin.id);
        let Some(task) = self.store.tasks().get(id) else {
            return Err(EngineError::TaskNotFound(id));
        };

        let mut guard = task.lock();
        if guard.status().is_finished() {
            return Ok(());
        }

        let Step::Script {
            name,
            container_id,
            command,
            args,
            ..
        } = guard.get().step.clone()
        else {
            tracing::warn!(task = %id, "script finish for a non-script step");
            return Ok(());
        };

        let succeeded = exit_status == 0;

        guard.update_step(Step::Script {
            name,
            container_id,
            command,
            args,
            outputs: Some(ScriptOutputs {
                exit_status,
                succeeded,
            }),
        });
        guard.finish(if succeeded {
            Status::Succeeded
        } else {
            Status::Failed
        })?;
        self.publish_status_changed(guard.get())?;
        guard.commit();

        Ok(())
    }

    /// `error`: the worker could not run the step at all.
    fn error(&self, origin: &EventOrigin, message: &str) -> Result<(), EngineError> {
        let id = TaskId::from(origin.id);
        let Some(task) = self.store.tasks().get(id) else {
            return Err(EngineError::TaskNotFound(id));
        };

        let mut guard = task.lock();
        if guard.status().is_finished() {
            return Ok(());
        }

        tracing::warn!(task = %id, message, "task errored on worker");

        guard.finish(Status::Errored)?;
        self.publish_status_changed(guard.get())?;
        guard.commit();

        Ok(())
    }

    /// `task:abort`: tell the worker to stop a running script, then finish
    /// the task as aborted.
    fn task_abort(&self, origin: &EventOrigin) -> Result<(), EngineError> {
        let id = TaskId::from(origin.id);
        let Some(task) = self.store.tasks().get(id) else {
            return Err(EngineError::TaskNotFound(id));
        };

        let mut guard = task.lock();
        if guard.status().is_finished() {
            return Ok(());
        }

        if guard.status().is_running() && matches!(guard.get().step, Step::Script { .. }) {
            self.publisher.publish(Event::ScriptAbort {
                origin: EventOrigin::new(id, &self.clock),
            })?;
        }

        guard.abort()?;
        self.publish_status_changed(guard.get())?;
        guard.commit();

        Ok(())
    }

    fn publish_status_changed(&self, task: &Task) -> Result<(), EngineError> {
        self.publisher.publish(Event::TaskStatus {
            origin: EventOrigin::new(task.id, &self.clock),
            status: task.status,
            job_id: task.job_id,
        })?;
        Ok(())
    }
}

impl<P: Publisher, C: Clock> EventProcessor for TaskProcessor<P, C> {
    fn filters(&self) -> Vec<EventFilter> {
        vec![by_type([
            EventKind::TaskStatus,
            EventKind::InitContainerFinish,
            EventKind::ScriptFinish,
            EventKind::Error,
            EventKind::TaskAbort,
        ])]
    }

    fn process_event(&self, event: &Event) -> Result<(), EngineError> {
        match event {
            Event::TaskStatus { origin, status, .. } => self.task_status(origin, *status),
            Event::InitContainerFinish {
                origin,
                container_id,
            } => self.init_container_finish(origin, container_id),
            Event::ScriptFinish {
                origin,
                exit_status,
                ..
            } => self.script_finish(origin, *exit_status),
            Event::Error { origin, message } => self.error(origin, message),
            Event::TaskAbort { origin } => self.task_abort(origin),
            other => {
                tracing::error!(event = other.name(), "task processor: unexpected event");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
