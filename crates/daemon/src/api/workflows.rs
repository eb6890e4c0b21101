// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow CRUD handlers.

use super::{parse_id, ApiError, AppState, Page};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use wf_core::{Workflow, WorkflowConfig, WorkflowId};

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRequest {
    name: String,
    #[serde(default)]
    config: WorkflowConfig,
}

impl WorkflowRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(ApiError::BadRequest("workflow name is required".into()));
        }
        Ok(())
    }
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Json<Vec<Workflow>> {
    Json(state.store.workflows().list(page.offset, page.limit))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Json(request): Json<WorkflowRequest>,
) -> Result<Json<Workflow>, ApiError> {
    request.validate()?;

    let workflow = Workflow {
        id: WorkflowId::new(),
        name: request.name,
        config: request.config,
        curr_build_id: None,
    };
    let handle = state.store.workflows().insert(workflow);
    Ok(Json(handle.model()))
}

pub(crate) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let handle = state
        .store
        .workflows()
        .get(id)
        .ok_or(ApiError::NotFound("workflow"))?;
    Ok(Json(handle.model()))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<WorkflowRequest>,
) -> Result<Json<Workflow>, ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    request.validate()?;

    let handle = state
        .store
        .workflows()
        .get(id)
        .ok_or(ApiError::NotFound("workflow"))?;
    handle.update(request.name, request.config);
    Ok(Json(handle.model()))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), ApiError> {
    let id: WorkflowId = parse_id(&id)?;
    let handle = state
        .store
        .workflows()
        .get(id)
        .ok_or(ApiError::NotFound("workflow"))?;
    state.store.delete_workflow(&handle)?;
    Ok(())
}
