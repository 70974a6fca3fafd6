//! Time-tracking endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use planroom_common::TimeEntry;
use planroom_db::TimeSummary;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub project_name: String,
    pub user_email: String,
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub user_email: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub user_email: String,
}

/// POST /api/time-tracking
pub async fn start_tracking(
    State(state): State<SharedState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<TimeEntry>, ApiError> {
    Ok(Json(state.time_entries.start(req.project_name, req.user_email).await?))
}

/// PUT /api/time-tracking/{id}
pub async fn stop_tracking(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<TimeEntry>, ApiError> {
    Ok(Json(state.time_entries.stop(id).await?))
}

/// GET /api/time-tracking/active/{email}
pub async fn active_entry(
    State(state): State<SharedState>,
    Path(email): Path<String>,
) -> Result<Json<Option<TimeEntry>>, ApiError> {
    Ok(Json(state.time_entries.active_for(&email).await?))
}

/// GET /api/time-tracking/project/{name}
pub async fn project_entries(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(q): Query<EntriesQuery>,
) -> Result<Json<Vec<TimeEntry>>, ApiError> {
    Ok(Json(state.time_entries.list_for_project(&name, &q.user_email, q.limit).await?))
}

/// GET /api/time-tracking/summary/{name}
pub async fn project_summary(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(q): Query<SummaryQuery>,
) -> Result<Json<TimeSummary>, ApiError> {
    Ok(Json(state.time_entries.summary(&name, &q.user_email).await?))
}

/// DELETE /api/time-tracking/{id}
pub async fn delete_entry(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.time_entries.delete(id).await?;
    Ok(Json(json!({ "message": "Time entry deleted successfully" })))
}
