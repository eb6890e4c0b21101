// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planner: pure transform from a workflow into a build, its jobs and
//! tasks, and the linked execution plans driving them.
//!
//! Every job expands to an init task, one task per script, and a cleanup
//! task. An empty script set still gets init and cleanup; cleanup degrades
//! to a no-op on the worker when no container was initialized.

use thiserror::Error;
use wf_core::{
    Build, BuildId, Job, JobConfig, JobId, JobPlan, PlanRef, Status, Step, Task, TaskId, TaskPlan,
    Workflow,
};

const INIT_TASK_NAME: &str = "init";
const CLEANUP_TASK_NAME: &str = "clean up";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("empty job set")]
    EmptyJobSet,
}

/// Everything the planner materializes for one build, ready for atomic
/// insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutput {
    pub build: Build,
    pub jobs: Vec<Job>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic apart from id allocation: N jobs in, N job-plan nodes
    /// out, each with `scripts + 2` task-plan nodes. All rows start in
    /// `created`.
    pub fn plan(&self, workflow: &Workflow) -> Result<PlanOutput, PlanError> {
        if workflow.config.jobs.is_empty() {
            return Err(PlanError::EmptyJobSet);
        }

        let build_id = BuildId::new();

        let mut jobs = Vec::with_capacity(workflow.config.jobs.len());
        let mut tasks = Vec::new();
        for config in &workflow.config.jobs {
            let (job, job_tasks) = self.plan_job(build_id, config.clone());
            jobs.push(job);
            tasks.extend(job_tasks);
        }

        let mut next: Option<Box<JobPlan>> = None;
        for job in jobs.iter().rev() {
            next = Some(Box::new(JobPlan {
                node: PlanRef { id: job.id },
                config: job.config.clone(),
                next,
            }));
        }
        let Some(plan) = next else {
            return Err(PlanError::EmptyJobSet);
        };

        Ok(PlanOutput {
            build: Build {
                id: build_id,
                workflow_id: workflow.id,
                status: Status::Created,
                config: workflow.config.clone(),
                plan: *plan,
            },
            jobs,
            tasks,
        })
    }

    fn plan_job(&self, build_id: BuildId, config: JobConfig) -> (Job, Vec<Task>) {
        let job_id = JobId::new();

        let mut steps = Vec::with_capacity(config.run.scripts.len() + 2);
        steps.push(Step::Init {
            name: INIT_TASK_NAME.into(),
            image: config.run.image.clone(),
            cwd: config.run.cwd.clone(),
            env: config.run.env.clone(),
            outputs: None,
        });
        for script in &config.run.scripts {
            steps.push(Step::Script {
                name: script.name.clone(),
                container_id: String::new(),
                command: script.command.clone(),
                args: script.args.clone(),
                outputs: None,
            });
        }
        steps.push(Step::Cleanup {
            name: CLEANUP_TASK_NAME.into(),
            container_id: String::new(),
        });

        let tasks: Vec<Task> = steps
            .into_iter()
            .map(|step| Task {
                id: TaskId::new(),
                job_id,
                name: step.name().to_string(),
                status: Status::Created,
                step,
            })
            .collect();

        // The chain always has at least init and cleanup; hang the rest off
        // the init head.
        let mut next: Option<Box<TaskPlan>> = None;
        for task in tasks.iter().skip(1).rev() {
            next = Some(Box::new(TaskPlan {
                node: PlanRef { id: task.id },
                config: task.step.clone(),
                next,
            }));
        }
        let plan = TaskPlan {
            node: PlanRef { id: tasks[0].id },
            config: tasks[0].step.clone(),
            next,
        };

        let job = Job {
            id: job_id,
            build_id,
            name: config.name.clone(),
            status: Status::Created,
            config,
            plan,
        };

        (job, tasks)
    }
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
