//! Workspace invitations.

use axum::extract::State;
use axum::Json;
use planroom_common::Invitation;
use planroom_db::InvitationCreate;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub token: String,
}

/// POST /api/auth/invite
pub async fn create_invitation(
    State(state): State<SharedState>,
    Json(payload): Json<InvitationCreate>,
) -> Result<Json<Invitation>, ApiError> {
    Ok(Json(state.invitations.invite(payload).await?))
}

/// POST /api/auth/invite/accept
pub async fn accept_invitation(
    State(state): State<SharedState>,
    Json(req): Json<AcceptRequest>,
) -> Result<Json<Invitation>, ApiError> {
    Ok(Json(state.invitations.accept(&req.token).await?))
}

/// GET /api/auth/invite
pub async fn list_invitations(State(state): State<SharedState>) -> Result<Json<Vec<Invitation>>, ApiError> {
    Ok(Json(state.invitations.list().await?))
}
