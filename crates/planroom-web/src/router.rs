//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    extraction::{debug_extraction, engine_status, extract_pdf, refresh_engine},
    invitations::{accept_invitation, create_invitation, list_invitations},
    projects::{create_project, delete_project, get_project, list_projects, update_project},
    system::health,
    time_tracking::{active_entry, delete_entry, project_entries, project_summary, start_tracking, stop_tracking},
    uploads::{download_file, list_files, upload_files},
};
use crate::state::{AppState, SharedState};

/// Request body cap for uploads.
pub const MAX_BODY_BYTES: usize = 200 * 1024 * 1024;

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/health", get(health))

        // PDF extraction
        .route("/api/pdf-extraction",                post(extract_pdf))
        .route("/api/pdf-extraction/debug",          post(debug_extraction))
        .route("/api/pdf-extraction/engine",         get(engine_status))
        .route("/api/pdf-extraction/engine/refresh", post(refresh_engine))

        // Projects
        .route("/api/projects",        get(list_projects).post(create_project))
        .route("/api/projects/{name}", get(get_project).put(update_project).delete(delete_project))

        // Time tracking
        .route("/api/time-tracking",                post(start_tracking))
        .route("/api/time-tracking/{id}",           put(stop_tracking).delete(delete_entry))
        .route("/api/time-tracking/active/{email}", get(active_entry))
        .route("/api/time-tracking/project/{name}", get(project_entries))
        .route("/api/time-tracking/summary/{name}", get(project_summary))

        // Uploads
        .route("/api/uploads",               get(list_files).post(upload_files))
        .route("/api/uploads/{id}/download", get(download_file))

        // Invitations
        .route("/api/auth/invite",        get(list_invitations).post(create_invitation))
        .route("/api/auth/invite/accept", post(accept_invitation))

        // Middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
