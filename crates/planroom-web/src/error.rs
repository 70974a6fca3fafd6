//! HTTP error mapping. Every error body is `{"detail": "<message>"}`.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use planroom_common::PlanroomError;
use planroom_extraction::ExtractionError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), detail = %self, "Request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<PlanroomError> for ApiError {
    fn from(err: PlanroomError) -> Self {
        match err {
            PlanroomError::NotFound(m) => ApiError::NotFound(m),
            PlanroomError::Conflict(m) => ApiError::Conflict(m),
            PlanroomError::InvalidInput(m) => ApiError::BadRequest(m),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        if err.is_input_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(format!("Error processing PDF: {err}"))
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_errors_map_to_status() {
        assert_eq!(ApiError::from(ExtractionError::NotPdf).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(ExtractionError::InsufficientText).status(), StatusCode::BAD_REQUEST);

        let internal = ApiError::from(ExtractionError::Internal(anyhow::anyhow!("worker died")));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.to_string(), "Error processing PDF: worker died");
    }

    #[test]
    fn test_store_errors_map_to_status() {
        let err = ApiError::from(PlanroomError::NotFound("Project not found".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Project not found");
        assert_eq!(
            ApiError::from(PlanroomError::Storage("disk full".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
