// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task step variants and output threading.
//!
//! A [`Step`] describes what one task executes on a worker: container
//! initialization, one script, or container cleanup. When a step terminates
//! its `outputs` record is filled in; downstream steps in the same job read
//! those outputs (the container id above all) through the [`Outputs`]
//! accumulator before they are scheduled.

use serde::{Deserialize, Serialize};

/// What a task executes on a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Pull the image and start the job's container.
    Init {
        name: String,
        image: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        env: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outputs: Option<InitOutputs>,
    },

    /// Run one script inside the job's container.
    Script {
        name: String,
        /// Resolved from the init step's outputs before scheduling.
        #[serde(default, rename = "containerId", skip_serializing_if = "String::is_empty")]
        container_id: String,
        command: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outputs: Option<ScriptOutputs>,
    },

    /// Tear down the job's container. Fire-and-forget on the worker.
    Cleanup {
        name: String,
        #[serde(default, rename = "containerId", skip_serializing_if = "String::is_empty")]
        container_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitOutputs {
    #[serde(rename = "containerId")]
    pub container_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptOutputs {
    pub exit_status: i32,
    pub succeeded: bool,
}

impl Step {
    pub fn name(&self) -> &str {
        match self {
            Step::Init { name, .. } | Step::Script { name, .. } | Step::Cleanup { name, .. } => {
                name
            }
        }
    }
}

/// Accumulator threaded left-to-right along a job's task chain.
///
/// Collected from finished steps, applied to created steps before they are
/// persisted and scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs {
    pub container_id: Option<String>,
}

impl Outputs {
    /// Harvest outputs from a finished step.
    pub fn collect(&mut self, step: &Step) {
        if let Step::Init {
            outputs: Some(outputs),
            ..
        } = step
        {
            self.container_id = Some(outputs.container_id.clone());
        }
    }

    /// Resolve accumulated outputs into a step that has not run yet.
    pub fn apply(&self, step: &mut Step) {
        let Some(id) = &self.container_id else {
            return;
        };

        match step {
            Step::Script { container_id, .. } | Step::Cleanup { container_id, .. } => {
                *container_id = id.clone();
            }
            Step::Init { .. } => {}
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
