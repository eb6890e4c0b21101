// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the workflower control plane.
//!
//! Serializes with `{"event": "<tag>", "payload": {...}}` — the envelope the
//! worker wire protocol speaks. Payload fields are camelCase; every payload
//! carries the flattened [`EventOrigin`] header.

mod codec;
mod filters;
mod publisher;

pub use codec::{decode, encode, CodecError};
pub use filters::{by_origin_id, by_type, exclude_types, EventFilter};
pub use publisher::{PublishError, Publisher};

use crate::clock::Clock;
use crate::id::{BuildId, JobId, OriginId, WorkflowId};
use crate::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header present on every event: the id of the build/job/task the event
/// pertains to and the instant it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOrigin {
    pub id: OriginId,
    pub occurred_at: DateTime<Utc>,
}

impl EventOrigin {
    pub fn new(id: impl Into<OriginId>, clock: &impl Clock) -> Self {
        Self {
            id: id.into(),
            occurred_at: clock.now_utc(),
        }
    }

    pub fn at(id: impl Into<OriginId>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            occurred_at,
        }
    }
}

/// Container parameters carried by `init:container:start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
}

/// Script parameters carried by `script:start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSpec {
    pub container_id: String,
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// One line of task output with its capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub msg: String,
    pub time: DateTime<Utc>,
}

/// Events flowing over the bus and (a subset of them) over the worker wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Event {
    // -- worker-bound commands --
    #[serde(rename = "init:container:start")]
    InitContainerStart {
        #[serde(flatten)]
        origin: EventOrigin,
        config: ContainerSpec,
    },

    #[serde(rename = "script:start")]
    ScriptStart {
        #[serde(flatten)]
        origin: EventOrigin,
        config: ScriptSpec,
    },

    #[serde(rename = "script:abort")]
    ScriptAbort {
        #[serde(flatten)]
        origin: EventOrigin,
    },

    #[serde(rename = "cleanup:container", rename_all = "camelCase")]
    CleanupContainer {
        #[serde(flatten)]
        origin: EventOrigin,
        container_id: String,
    },

    // -- worker results --
    #[serde(rename = "init:container:finish", rename_all = "camelCase")]
    InitContainerFinish {
        #[serde(flatten)]
        origin: EventOrigin,
        container_id: String,
    },

    #[serde(rename = "script:finish", rename_all = "camelCase")]
    ScriptFinish {
        #[serde(flatten)]
        origin: EventOrigin,
        exit_status: i32,
        succeeded: bool,
    },

    #[serde(rename = "task:log")]
    TaskLog {
        #[serde(flatten)]
        origin: EventOrigin,
        messages: Vec<LogMessage>,
    },

    #[serde(rename = "error")]
    Error {
        #[serde(flatten)]
        origin: EventOrigin,
        message: String,
    },

    // -- status --
    #[serde(rename = "build:status", rename_all = "camelCase")]
    BuildStatus {
        #[serde(flatten)]
        origin: EventOrigin,
        status: Status,
        workflow_id: WorkflowId,
    },

    #[serde(rename = "job:status", rename_all = "camelCase")]
    JobStatus {
        #[serde(flatten)]
        origin: EventOrigin,
        status: Status,
        build_id: BuildId,
    },

    #[serde(rename = "task:status", rename_all = "camelCase")]
    TaskStatus {
        #[serde(flatten)]
        origin: EventOrigin,
        status: Status,
        job_id: JobId,
    },

    // -- abort --
    #[serde(rename = "build:abort")]
    BuildAbort {
        #[serde(flatten)]
        origin: EventOrigin,
    },

    #[serde(rename = "job:abort")]
    JobAbort {
        #[serde(flatten)]
        origin: EventOrigin,
    },

    #[serde(rename = "task:abort")]
    TaskAbort {
        #[serde(flatten)]
        origin: EventOrigin,
    },
}

/// Tag-only variant of [`Event`] used by filters and the decoder table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    InitContainerStart,
    ScriptStart,
    ScriptAbort,
    CleanupContainer,
    InitContainerFinish,
    ScriptFinish,
    TaskLog,
    Error,
    BuildStatus,
    JobStatus,
    TaskStatus,
    BuildAbort,
    JobAbort,
    TaskAbort,
}

impl EventKind {
    pub const ALL: [EventKind; 14] = [
        EventKind::InitContainerStart,
        EventKind::ScriptStart,
        EventKind::ScriptAbort,
        EventKind::CleanupContainer,
        EventKind::InitContainerFinish,
        EventKind::ScriptFinish,
        EventKind::TaskLog,
        EventKind::Error,
        EventKind::BuildStatus,
        EventKind::JobStatus,
        EventKind::TaskStatus,
        EventKind::BuildAbort,
        EventKind::JobAbort,
        EventKind::TaskAbort,
    ];

    /// The stable wire tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            EventKind::InitContainerStart => "init:container:start",
            EventKind::ScriptStart => "script:start",
            EventKind::ScriptAbort => "script:abort",
            EventKind::CleanupContainer => "cleanup:container",
            EventKind::InitContainerFinish => "init:container:finish",
            EventKind::ScriptFinish => "script:finish",
            EventKind::TaskLog => "task:log",
            EventKind::Error => "error",
            EventKind::BuildStatus => "build:status",
            EventKind::JobStatus => "job:status",
            EventKind::TaskStatus => "task:status",
            EventKind::BuildAbort => "build:abort",
            EventKind::JobAbort => "job:abort",
            EventKind::TaskAbort => "task:abort",
        }
    }

    /// Reverse lookup for the decoder. Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        EventKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::InitContainerStart { .. } => EventKind::InitContainerStart,
            Event::ScriptStart { .. } => EventKind::ScriptStart,
            Event::ScriptAbort { .. } => EventKind::ScriptAbort,
            Event::CleanupContainer { .. } => EventKind::CleanupContainer,
            Event::InitContainerFinish { .. } => EventKind::InitContainerFinish,
            Event::ScriptFinish { .. } => EventKind::ScriptFinish,
            Event::TaskLog { .. } => EventKind::TaskLog,
            Event::Error { .. } => EventKind::Error,
            Event::BuildStatus { .. } => EventKind::BuildStatus,
            Event::JobStatus { .. } => EventKind::JobStatus,
            Event::TaskStatus { .. } => EventKind::TaskStatus,
            Event::BuildAbort { .. } => EventKind::BuildAbort,
            Event::JobAbort { .. } => EventKind::JobAbort,
            Event::TaskAbort { .. } => EventKind::TaskAbort,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().tag()
    }

    pub fn origin(&self) -> &EventOrigin {
        match self {
            Event::InitContainerStart { origin, .. }
            | Event::ScriptStart { origin, .. }
            | Event::ScriptAbort { origin }
            | Event::CleanupContainer { origin, .. }
            | Event::InitContainerFinish { origin, .. }
            | Event::ScriptFinish { origin, .. }
            | Event::TaskLog { origin, .. }
            | Event::Error { origin, .. }
            | Event::BuildStatus { origin, .. }
            | Event::JobStatus { origin, .. }
            | Event::TaskStatus { origin, .. }
            | Event::BuildAbort { origin }
            | Event::JobAbort { origin }
            | Event::TaskAbort { origin } => origin,
        }
    }

    /// The status carried by a status event, `None` otherwise.
    pub fn status(&self) -> Option<Status> {
        match self {
            Event::BuildStatus { status, .. }
            | Event::JobStatus { status, .. }
            | Event::TaskStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
