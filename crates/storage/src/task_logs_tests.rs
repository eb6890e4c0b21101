// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task log append and newest-first paging tests.

use crate::Store;
use chrono::{Duration, TimeZone, Utc};
use wf_core::{LogMessage, TaskId};

fn messages(n: usize) -> Vec<LogMessage> {
    let base = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
    (0..n)
        .map(|i| LogMessage {
            msg: format!("line-{i}"),
            time: base + Duration::seconds(i as i64),
        })
        .collect()
}

#[test]
fn save_appends_in_order() {
    let store = Store::new();
    let task = TaskId::new();

    store.task_logs().save(task, messages(2));
    store.task_logs().save(
        task,
        vec![LogMessage {
            msg: "line-2".into(),
            time: Utc::now(),
        }],
    );

    let logs = store.task_logs().last_logs(task, 0, 10);
    assert_eq!(logs.len(), 3);
    // newest first
    assert_eq!(logs[0].msg, "line-2");
    assert_eq!(logs[2].msg, "line-0");
}

#[test]
fn last_logs_pages_from_the_newest() {
    let store = Store::new();
    let task = TaskId::new();
    store.task_logs().save(task, messages(5));

    let page = store.task_logs().last_logs(task, 1, 2);
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].msg, "line-3");
    assert_eq!(page[1].msg, "line-2");
}

#[test]
fn unknown_task_has_no_logs() {
    let store = Store::new();
    assert!(store.task_logs().last_logs(TaskId::new(), 0, 10).is_empty());
}

#[test]
fn empty_batch_is_ignored() {
    let store = Store::new();
    let task = TaskId::new();
    store.task_logs().save(task, vec![]);
    assert!(store.task_logs().last_logs(task, 0, 10).is_empty());
}
