// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent entity models.
//!
//! A workflow owns builds; a build owns jobs; a job owns tasks. Builds
//! snapshot the workflow config and carry the execution plan the planner
//! produced for them.

use crate::config::{JobConfig, WorkflowConfig};
use crate::id::{BuildId, JobId, TaskId, WorkflowId};
use crate::plan::{JobPlan, TaskPlan};
use crate::status::Status;
use crate::step::Step;
use serde::{Deserialize, Serialize};

/// User-defined template of jobs. At most one non-finished build at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub config: WorkflowConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curr_build_id: Option<BuildId>,
}

/// One execution instance of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: BuildId,
    pub workflow_id: WorkflowId,
    pub status: Status,
    /// Snapshot of the workflow config at plan time.
    pub config: WorkflowConfig,
    pub plan: JobPlan,
}

/// One container-scoped unit within a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub build_id: BuildId,
    pub name: String,
    pub status: Status,
    pub config: JobConfig,
    pub plan: TaskPlan,
}

/// Atomic step executed on a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub job_id: JobId,
    pub name: String,
    pub status: Status,
    pub step: Step,
}
