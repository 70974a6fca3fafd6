//! Project CRUD endpoints, addressed by project name.

use axum::extract::{Path, State};
use axum::Json;
use planroom_common::{Project, ProjectCreate, ProjectUpdate};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::SharedState;

/// POST /api/projects
pub async fn create_project(
    State(state): State<SharedState>,
    Json(payload): Json<ProjectCreate>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.projects.create(payload).await?))
}

/// GET /api/projects
pub async fn list_projects(State(state): State<SharedState>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.projects.list().await?))
}

/// GET /api/projects/{name}
pub async fn get_project(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.projects.get(&name).await?))
}

/// PUT /api/projects/{name}
pub async fn update_project(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.projects.update(&name, payload).await?))
}

/// DELETE /api/projects/{name}
pub async fn delete_project(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.projects.delete(&name).await?;
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}
