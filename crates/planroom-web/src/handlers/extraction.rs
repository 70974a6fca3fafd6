//! PDF title-block extraction endpoints.

use axum::extract::{Multipart, State};
use axum::Json;
use planroom_extraction::{CanonicalFields, DebugReport, ExtractionError, ExtractionInput};
use planroom_llm::AvailabilitySnapshot;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::SharedState;

/// The uploaded PDF: the `file` field, or the first field carrying a file name.
async fn read_upload(multipart: &mut Multipart) -> Result<ExtractionInput, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(ExtractionInput::new(file_name, bytes.to_vec()));
    }
    Err(ApiError::BadRequest("No file provided".into()))
}

/// POST /api/pdf-extraction
#[instrument(skip_all)]
pub async fn extract_pdf(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<CanonicalFields>, ApiError> {
    let input = read_upload(&mut multipart).await?;
    let fields = state.pipeline.process(input).await?;
    info!(filled = fields.filled(), "Extraction complete");
    Ok(Json(fields))
}

/// POST /api/pdf-extraction/debug
#[instrument(skip_all)]
pub async fn debug_extraction(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<DebugReport>, ApiError> {
    let input = read_upload(&mut multipart).await?;
    let report = state.pipeline.debug(input).await.map_err(|e| match e {
        ExtractionError::Internal(inner) => ApiError::Internal(format!("Error: {inner}")),
        other => ApiError::from(other),
    })?;
    Ok(Json(report))
}

/// POST /api/pdf-extraction/engine/refresh
pub async fn refresh_engine(State(state): State<SharedState>) -> Json<AvailabilitySnapshot> {
    state.availability.refresh(state.backend.as_ref()).await;
    Json(state.availability.status().await)
}

/// GET /api/pdf-extraction/engine
pub async fn engine_status(State(state): State<SharedState>) -> Json<AvailabilitySnapshot> {
    Json(state.availability.status().await)
}
