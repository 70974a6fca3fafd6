//! Stage file uploads and downloads.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use planroom_common::UploadedFile;
use planroom_db::uploads::check_stage;
use planroom_db::UploadTarget;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub stage: u8,
    pub dp_id: Option<i64>,
    pub project_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub stage: u8,
    pub dp_id: Option<i64>,
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    pub original_name: String,
    pub stored_name: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub count: usize,
    pub files: Vec<SavedFile>,
}

/// POST /api/uploads
pub async fn upload_files(
    State(state): State<SharedState>,
    Query(q): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    check_stage(q.stage)?;
    let target = UploadTarget {
        stage: q.stage,
        dp_id: q.dp_id,
        project_name: q.project_name,
        user_email: q.user_email,
    };

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(original) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        let record = state.uploads.save(&original, &bytes, &target).await?;
        files.push(SavedFile {
            original_name: record.original_name,
            stored_name: record.stored_name,
            size: record.size,
        });
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No files provided".into()));
    }
    info!(count = files.len(), stage = target.stage, "Uploaded files");
    Ok(Json(UploadResponse { count: files.len(), files }))
}

/// GET /api/uploads
pub async fn list_files(
    State(state): State<SharedState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<UploadedFile>>, ApiError> {
    Ok(Json(state.uploads.list(q.stage, q.dp_id, q.project_name.as_deref()).await?))
}

/// Header-safe rendering of a file name.
fn attachment_header(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

fn content_type(name: &str) -> &'static str {
    if name.to_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

/// GET /api/uploads/{id}/download
pub async fn download_file(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let (record, bytes) = state.uploads.download(id).await?;
    let headers = [
        (header::CONTENT_TYPE, content_type(&record.original_name).to_string()),
        (header::CONTENT_DISPOSITION, attachment_header(&record.original_name)),
    ];
    Ok((headers, bytes))
}
