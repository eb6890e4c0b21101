// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine errors.

use thiserror::Error;
use wf_core::{BuildId, JobId, PublishError, TaskId};
use wf_storage::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("build {0} not found")]
    BuildNotFound(BuildId),

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Turn transition-precondition failures into no-op acks.
///
/// Duplicate events racing a transition lose at the row lock and surface as
/// `AlreadyRunning`/`AlreadyFinished`; at the processor boundary those are
/// successful no-ops, not failures.
pub(crate) trait NoopOnPrecondition {
    fn noop_on_precondition(self) -> Result<(), StorageError>;
}

impl NoopOnPrecondition for Result<(), StorageError> {
    fn noop_on_precondition(self) -> Result<(), StorageError> {
        match self {
            Err(StorageError::AlreadyRunning) | Err(StorageError::AlreadyFinished) => Ok(()),
            other => other,
        }
    }
}
