// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status predicate and serde tests.

use super::*;
use yare::parameterized;

#[parameterized(
    created = { Status::Created, false, false },
    pending = { Status::Pending, true, false },
    started = { Status::Started, true, false },
    succeeded = { Status::Succeeded, false, true },
    failed = { Status::Failed, false, true },
    errored = { Status::Errored, false, true },
    aborted = { Status::Aborted, false, true },
    skipped = { Status::Skipped, false, true },
)]
fn predicates(status: Status, running: bool, finished: bool) {
    assert_eq!(status.is_running(), running);
    assert_eq!(status.is_finished(), finished);
}

#[test]
fn running_and_finished_are_disjoint() {
    for status in [
        Status::Created,
        Status::Pending,
        Status::Started,
        Status::Succeeded,
        Status::Failed,
        Status::Errored,
        Status::Aborted,
        Status::Skipped,
    ] {
        assert!(!(status.is_running() && status.is_finished()), "{status}");
    }
}

#[parameterized(
    created = { Status::Created, "created" },
    succeeded = { Status::Succeeded, "succeeded" },
    errored = { Status::Errored, "errored" },
)]
fn serde_uses_lowercase(status: Status, expected: &str) {
    let json = serde_json::to_string(&status).unwrap();
    assert_eq!(json, format!("\"{expected}\""));
    assert_eq!(status.to_string(), expected);

    let back: Status = serde_json::from_str(&json).unwrap();
    assert_eq!(back, status);
}
