// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publishing side of the bus contract.

use super::Event;
use thiserror::Error;

/// Publishing fails only when the bus has shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event bus is closed")]
pub struct PublishError;

/// Anything that can put events on the bus. Non-blocking: implementations
/// must never stall the caller on slow consumers.
pub trait Publisher: Send + Sync {
    fn publish(&self, event: Event) -> Result<(), PublishError>;
}

impl<P: Publisher + ?Sized> Publisher for std::sync::Arc<P> {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        (**self).publish(event)
    }
}
