// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP façade over the store, the planner, and the bus.
//!
//! Thin by design: handlers validate, call the factories, and publish the
//! triggering event; every state transition happens in the processors.

mod builds;
mod jobs_tasks;
mod workflows;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wf_core::Publisher;
use wf_engine::Planner;
use wf_storage::{StorageError, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub publisher: Arc<dyn Publisher>,
    pub planner: Planner,
}

impl AppState {
    pub fn new(store: Store, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            store,
            publisher,
            planner: Planner::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/workflows",
            get(workflows::list).post(workflows::create),
        )
        .route(
            "/api/workflows/:id",
            get(workflows::get_one)
                .put(workflows::update)
                .delete(workflows::delete),
        )
        .route(
            "/api/workflows/:id/builds",
            get(builds::list).post(builds::start),
        )
        .route("/api/builds/:id", get(builds::get_one))
        .route("/api/builds/:id/abort", post(builds::abort))
        .route("/api/builds/:id/jobs", get(jobs_tasks::list_jobs))
        .route("/api/jobs/:id", get(jobs_tasks::get_job))
        .route("/api/jobs/:id/tasks", get(jobs_tasks::list_tasks))
        .route("/api/tasks/:id", get(jobs_tasks::get_task))
        .route("/api/tasks/:id/logs", get(jobs_tasks::task_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Listing page bounds shared by every collection endpoint.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct Page {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("workflow has an active build")]
    Conflict,

    #[error("event bus unavailable")]
    Internal,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlreadyRunning
            | StorageError::AlreadyFinished
            | StorageError::IsNotRunning => ApiError::Conflict,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Path ids are uuids; anything else is a 400.
pub(crate) fn parse_id<T: std::str::FromStr>(id: &str) -> Result<T, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid id: {id}")))
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
