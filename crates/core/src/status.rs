// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity lifecycle status shared by builds, jobs, and tasks.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a build, job, or task.
///
/// Transitions move strictly forward:
/// `created → pending → started → {succeeded|failed|errored|aborted}`.
/// `skipped` is a terminal status reserved for planner-level omission.
/// No transition leaves a finished status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Created,
    Pending,
    Started,
    Succeeded,
    Failed,
    Errored,
    Aborted,
    Skipped,
}

impl Status {
    pub fn is_created(self) -> bool {
        self == Status::Created
    }

    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }

    pub fn is_started(self) -> bool {
        self == Status::Started
    }

    pub fn is_succeeded(self) -> bool {
        self == Status::Succeeded
    }

    /// Running covers both the scheduled and the executing phase.
    pub fn is_running(self) -> bool {
        matches!(self, Status::Pending | Status::Started)
    }

    /// Finished statuses are terminal; nothing transitions out of them.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            Status::Succeeded
                | Status::Failed
                | Status::Errored
                | Status::Aborted
                | Status::Skipped
        )
    }
}

crate::simple_display! {
    Status {
        Created => "created",
        Pending => "pending",
        Started => "started",
        Succeeded => "succeeded",
        Failed => "failed",
        Errored => "errored",
        Aborted => "aborted",
        Skipped => "skipped",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
