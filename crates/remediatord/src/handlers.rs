//! Route handlers.
//!
//! POST /api/v1/execute               open an incident, run or park for approval
//! POST /api/v1/plans/:id/approve     run a waiting plan
//! POST /api/v1/plans/:id/reject      flag for manual intervention
//! GET  /api/v1/tasks/:id             status and timeline
//! GET  /health                       liveness

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use remediator_core::{ExecuteResponse, Rejection, RemediationOutcome, RemediationService, TaskView};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Shared handler state.
pub struct AppState {
    pub service: RemediationService,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub request: String,
    #[serde(default)]
    pub require_approval: bool,
}

pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    state
        .service
        .execute(&req.request, req.require_approval)
        .await
        .map(Json)
        // any failure on this route is a 500
        .map_err(|e| ApiError::internal(e.to_string()))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RemediationOutcome>, ApiError> {
    Ok(Json(state.service.approve(&id).await?))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Rejection>, ApiError> {
    Ok(Json(state.service.reject(&id).await?))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskView>, ApiError> {
    Ok(Json(state.service.task_status(&id).await?))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
