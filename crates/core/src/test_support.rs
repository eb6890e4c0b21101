// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by this crate's tests and (via the `test-support`
//! feature) by the storage, engine, and daemon test suites.

use crate::config::{JobConfig, RunConfig, ScriptConfig, WorkflowConfig};
use crate::event::EventOrigin;
use crate::id::{OriginId, WorkflowId};
use crate::model::Workflow;
use chrono::{TimeZone, Utc};

/// A workflow config with `jobs` jobs of `scripts` scripts each, all running
/// in an alpine container.
pub fn workflow_config(jobs: usize, scripts: usize) -> WorkflowConfig {
    WorkflowConfig {
        jobs: (0..jobs)
            .map(|j| JobConfig {
                name: format!("job-{j}"),
                run: RunConfig {
                    image: "alpine".into(),
                    cwd: None,
                    env: vec![],
                    scripts: (0..scripts)
                        .map(|s| ScriptConfig {
                            name: format!("script-{s}"),
                            command: vec!["echo".into(), "hi".into()],
                            args: vec![],
                        })
                        .collect(),
                },
            })
            .collect(),
    }
}

pub fn workflow(name: &str, config: WorkflowConfig) -> Workflow {
    Workflow {
        id: WorkflowId::new(),
        name: name.into(),
        config,
        curr_build_id: None,
    }
}

/// Event origin with a fixed, deterministic timestamp.
pub fn origin(id: impl Into<OriginId>) -> EventOrigin {
    EventOrigin::at(
        id,
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default(),
    )
}
