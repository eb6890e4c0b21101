// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition precondition errors.
//!
//! These are the only errors the façade produces: every lookup returns an
//! `Option` instead of a not-found error, and in-memory appends cannot fail.
//! Arriving via the bus they are swallowed as no-op acks; arriving via the
//! HTTP API they surface as 409.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("already running")]
    AlreadyRunning,

    #[error("already finished")]
    AlreadyFinished,

    #[error("not running")]
    IsNotRunning,
}
