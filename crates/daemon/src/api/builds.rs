// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build handlers: listing, starting, aborting.

use super::{parse_id, ApiError, AppState};
use axum::extract::{Path, State};
use axum::Json;
use wf_core::{Build, BuildId, Event, EventOrigin, Status, SystemClock, WorkflowId};
use wf_engine::PlanError;

pub(crate) async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Build>>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    if state.store.workflows().get(id).is_none() {
        return Err(ApiError::NotFound("workflow"));
    }
    Ok(Json(state.store.builds().by_workflow(id)))
}

/// Plan the workflow, insert every row atomically, and kick the build off
/// with `build:status(pending)`. 409 while the previous build is active.
pub(crate) async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Build>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let handle = state
        .store
        .workflows()
        .get(id)
        .ok_or(ApiError::NotFound("workflow"))?;

    // cheap pre-check; insert_plan re-checks under the workflow row lock
    if let Some(curr) = handle.curr_build_id() {
        let active = state
            .store
            .builds()
            .get(curr)
            .is_some_and(|b| !b.model().status.is_finished());
        if active {
            return Err(ApiError::Conflict);
        }
    }

    let output = state.planner.plan(&handle.model()).map_err(|err| match err {
        PlanError::EmptyJobSet => ApiError::BadRequest("workflow has no jobs".into()),
    })?;

    let build = output.build.clone();
    state
        .store
        .insert_plan(&handle, output.build, output.jobs, output.tasks)?;

    if let Err(err) = state.publisher.publish(Event::BuildStatus {
        origin: EventOrigin::new(build.id, &SystemClock),
        status: Status::Pending,
        workflow_id: id,
    }) {
        tracing::error!(build = %build.id, error = %err, "failed to publish build start");
    }

    Ok(Json(build))
}

pub(crate) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Build>, ApiError> {
    let id: BuildId = parse_id(&id)?;
    let handle = state
        .store
        .builds()
        .get(id)
        .ok_or(ApiError::NotFound("build"))?;
    Ok(Json(handle.model()))
}

/// Publishes `build:abort`; the processors cascade from there.
pub(crate) async fn abort(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Build>, ApiError> {
    let id: BuildId = parse_id(&id)?;
    let handle = state
        .store
        .builds()
        .get(id)
        .ok_or(ApiError::NotFound("build"))?;

    state
        .publisher
        .publish(Event::BuildAbort {
            origin: EventOrigin::new(id, &SystemClock),
        })
        .map_err(|_| ApiError::Internal)?;

    Ok(Json(handle.model()))
}
