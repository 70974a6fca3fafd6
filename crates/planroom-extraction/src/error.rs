use thiserror::Error;

/// Reasons an extraction request is rejected.
///
/// Inference failures are recovered inside the pipeline and never appear here.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Only PDF files are supported")]
    NotPdf,

    #[error("Empty PDF file")]
    EmptyFile,

    #[error(
        "Could not extract sufficient text from PDF. The PDF might be image-based or encrypted. \
         Please ensure the PDF contains selectable text."
    )]
    InsufficientText,

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ExtractionError {
    /// True for rejections caused by the uploaded file itself.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, ExtractionError::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
