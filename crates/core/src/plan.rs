// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution plans: singly linked lists of job/task references.
//!
//! The planner appends only, so plans are acyclic by construction and
//! immutable once persisted. `ref.id` equals the id of the row the node
//! represents.

use crate::config::JobConfig;
use crate::id::{JobId, TaskId};
use crate::step::Step;
use serde::{Deserialize, Serialize};

/// Reference to the entity row a plan node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRef<Id> {
    pub id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPlan {
    #[serde(rename = "ref")]
    pub node: PlanRef<JobId>,
    pub config: JobConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<JobPlan>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPlan {
    #[serde(rename = "ref")]
    pub node: PlanRef<TaskId>,
    pub config: Step,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<TaskPlan>>,
}

impl JobPlan {
    /// Iterate the chain head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &JobPlan> {
        PlanIter { node: Some(self) }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl TaskPlan {
    pub fn iter(&self) -> impl Iterator<Item = &TaskPlan> {
        PlanIter { node: Some(self) }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

struct PlanIter<'a, P> {
    node: Option<&'a P>,
}

macro_rules! plan_iter {
    ($plan:ty) => {
        impl<'a> Iterator for PlanIter<'a, $plan> {
            type Item = &'a $plan;

            fn next(&mut self) -> Option<Self::Item> {
                let node = self.node?;
                self.node = node.next.as_deref();
                Some(node)
            }
        }
    };
}

plan_iter!(JobPlan);
plan_iter!(TaskPlan);

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
