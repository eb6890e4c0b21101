// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row cells, pessimistic locks, and transition guards.

use crate::error::StorageError;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use wf_core::{Build, Job, Status, Task};

/// One persisted row. The mutex is the row's pessimistic lock; holding it
/// serializes every transition on the entity.
#[derive(Debug)]
pub(crate) struct Row<T> {
    cell: Mutex<T>,
}

impl<T: Clone> Row<T> {
    pub(crate) fn new(value: T) -> Arc<Self> {
        Arc::new(Self {
            cell: Mutex::new(value),
        })
    }

    /// Read the current row value under a brief lock.
    pub(crate) fn snapshot(&self) -> T {
        self.cell.lock().clone()
    }

    /// Acquire the row lock for a critical section.
    pub(crate) fn lock(&self) -> RowGuard<'_, T> {
        let guard = self.cell.lock();
        let undo = guard.clone();
        RowGuard {
            guard,
            undo,
            committed: false,
        }
    }
}

/// A locked row. Mutations are kept only when [`RowGuard::commit`] is
/// called; dropping the guard without committing restores the pre-image,
/// which is what makes an early `?` return behave like a rollback.
pub struct RowGuard<'a, T: Clone> {
    guard: MutexGuard<'a, T>,
    undo: T,
    committed: bool,
}

impl<T: Clone> RowGuard<'_, T> {
    pub fn get(&self) -> &T {
        &self.guard
    }

    pub(crate) fn get_mut(&mut self) -> &mut T {
        &mut self.guard
    }

    /// Keep all mutations made while the lock was held.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl<T: Clone> Drop for RowGuard<'_, T> {
    fn drop(&mut self) {
        if !self.committed {
            *self.guard = self.undo.clone();
        }
    }
}

/// Entities with a lifecycle status column.
pub trait HasStatus: Clone {
    fn status(&self) -> Status;
    fn set_status(&mut self, status: Status);
}

impl HasStatus for Build {
    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

impl HasStatus for Job {
    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

impl HasStatus for Task {
    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

impl<T: HasStatus> RowGuard<'_, T> {
    pub fn status(&self) -> Status {
        self.get().status()
    }

    /// `created → pending`. Rejects running and finished rows, so duplicate
    /// scheduling events are observable no-ops.
    pub fn pending(&mut self) -> Result<(), StorageError> {
        let status = self.status();
        if status.is_running() {
            return Err(StorageError::AlreadyRunning);
        }
        if status.is_finished() {
            return Err(StorageError::AlreadyFinished);
        }
        self.get_mut().set_status(Status::Pending);
        Ok(())
    }

    /// `pending → started`.
    pub fn start(&mut self) -> Result<(), StorageError> {
        let status = self.status();
        if status.is_started() {
            return Err(StorageError::AlreadyRunning);
        }
        if status.is_finished() {
            return Err(StorageError::AlreadyFinished);
        }
        self.get_mut().set_status(Status::Started);
        Ok(())
    }

    /// Transition into a terminal status. Rejected once finished; the first
    /// terminal event wins and later duplicates become no-ops.
    pub fn finish(&mut self, status: Status) -> Result<(), StorageError> {
        if self.status().is_finished() {
            return Err(StorageError::AlreadyFinished);
        }
        self.get_mut().set_status(status);
        Ok(())
    }

    pub fn abort(&mut self) -> Result<(), StorageError> {
        self.finish(Status::Aborted)
    }
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
