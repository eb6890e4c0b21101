// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job and task read handlers.

use super::{parse_id, ApiError, AppState, Page};
use axum::extract::{Path, Query, State};
use axum::Json;
use wf_core::{BuildId, Job, JobId, LogMessage, Task, TaskId};

pub(crate) async fn list_jobs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let id: BuildId = parse_id(&id)?;
    if state.store.builds().get(id).is_none() {
        return Err(ApiError::NotFound("build"));
    }
    let jobs = state
        .store
        .jobs()
        .by_build(id)
        .iter()
        .map(|job| job.model())
        .collect();
    Ok(Json(jobs))
}

pub(crate) async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let id: JobId = parse_id(&id)?;
    let handle = state.store.jobs().get(id).ok_or(ApiError::NotFound("job"))?;
    Ok(Json(handle.model()))
}

pub(crate) async fn list_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let id: JobId = parse_id(&id)?;
    if state.store.jobs().get(id).is_none() {
        return Err(ApiError::NotFound("job"));
    }
    let tasks = state
        .store
        .tasks()
        .by_job(id)
        .iter()
        .map(|task| task.model())
        .collect();
    Ok(Json(tasks))
}

pub(crate) async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id: TaskId = parse_id(&id)?;
    let handle = state
        .store
        .tasks()
        .get(id)
        .ok_or(ApiError::NotFound("task"))?;
    Ok(Json(handle.model()))
}

/// Newest-first page of a task's logs.
pub(crate) async fn task_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<LogMessage>>, ApiError> {
    let id: TaskId = parse_id(&id)?;
    if state.store.tasks().get(id).is_none() {
        return Err(ApiError::NotFound("task"));
    }
    Ok(Json(
        state.store.task_logs().last_logs(id, page.offset, page.limit),
    ))
}
