// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher tests: serial processing, error isolation, cancellation.

use super::*;
use crate::bus::Bus;
use crate::error::EngineError;
use parking_lot::Mutex;
use std::sync::Arc;
use wf_core::{by_type, Event, EventKind, EventOrigin, Publisher, Status, TaskId};

struct Recording {
    seen: Arc<Mutex<Vec<Status>>>,
    fail_on_first: bool,
}

impl EventProcessor for Recording {
    fn filters(&self) -> Vec<wf_core::EventFilter> {
        vec![by_type([EventKind::TaskStatus])]
    }

    fn process_event(&self, event: &Event) -> Result<(), EngineError> {
        let Some(status) = event.status() else {
            return Ok(());
        };
        let first = {
            let mut seen = self.seen.lock();
            seen.push(status);
            seen.len() == 1
        };
        if first && self.fail_on_first {
            return Err(EngineError::TaskNotFound(TaskId::nil()));
        }
        Ok(())
    }
}

fn task_status(status: Status) -> Event {
    Event::TaskStatus {
        origin: EventOrigin::at(TaskId::new(), chrono::Utc::now()),
        status,
        job_id: wf_core::JobId::new(),
    }
}

async fn wait_for<T>(seen: &Arc<Mutex<Vec<T>>>, n: usize) {
    for _ in 0..200 {
        if seen.lock().len() >= n {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {n} events");
}

#[tokio::test]
async fn sync_watcher_processes_in_delivery_order() {
    let bus = Bus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let watcher = Watcher::spawn(
        &bus,
        Arc::new(Recording {
            seen: Arc::clone(&seen),
            fail_on_first: false,
        }),
    );

    for status in [Status::Pending, Status::Started, Status::Succeeded] {
        bus.publish(task_status(status)).unwrap();
    }
    // filtered out entirely
    bus.publish(Event::TaskAbort {
        origin: EventOrigin::at(TaskId::new(), chrono::Utc::now()),
    })
    .unwrap();

    wait_for(&seen, 3).await;
    assert_eq!(
        *seen.lock(),
        vec![Status::Pending, Status::Started, Status::Succeeded]
    );

    watcher.stop().await;
}

#[tokio::test]
async fn handler_error_does_not_terminate_the_subscriber() {
    let bus = Bus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let watcher = Watcher::spawn(
        &bus,
        Arc::new(Recording {
            seen: Arc::clone(&seen),
            fail_on_first: true,
        }),
    );

    bus.publish(task_status(Status::Pending)).unwrap();
    bus.publish(task_status(Status::Started)).unwrap();

    wait_for(&seen, 2).await;
    assert_eq!(*seen.lock(), vec![Status::Pending, Status::Started]);

    watcher.stop().await;
}

#[tokio::test]
async fn stop_cancels_the_watcher() {
    let bus = Bus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let watcher = Watcher::spawn(
        &bus,
        Arc::new(Recording {
            seen: Arc::clone(&seen),
            fail_on_first: false,
        }),
    );

    bus.publish(task_status(Status::Pending)).unwrap();
    wait_for(&seen, 1).await;

    watcher.stop().await;

    bus.publish(task_status(Status::Started)).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(*seen.lock(), vec![Status::Pending]);
}

#[tokio::test]
async fn spawn_mode_processes_every_event() {
    let bus = Bus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let watcher = Watcher::spawn_with(
        &bus,
        Arc::new(Recording {
            seen: Arc::clone(&seen),
            fail_on_first: false,
        }),
        Processing::Spawn,
    );

    for _ in 0..10 {
        bus.publish(task_status(Status::Pending)).unwrap();
    }

    wait_for(&seen, 10).await;
    watcher.stop().await;
}
