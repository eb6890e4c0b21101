// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wf-engine: the execution engine of the workflower control plane.
//!
//! Hosts the in-process event bus, the discard queues, the planner, and the
//! three cascading state-machine processors (build → job → task). The
//! processors run in sync watchers: serial processing per subscriber plus
//! per-row locks in the store is what linearizes concurrent terminal events.

mod bus;
mod error;
mod eventq;
mod planner;
pub mod processor;
mod watcher;

pub use bus::{Bus, BusError, Subscription, SubscriptionCloser};
pub use error::EngineError;
pub use eventq::EventQueue;
pub use planner::{PlanError, PlanOutput, Planner};
pub use processor::{BuildProcessor, JobProcessor, TaskProcessor};
pub use watcher::{EventProcessor, Processing, Watcher};

#[cfg(test)]
mod test_helpers;
