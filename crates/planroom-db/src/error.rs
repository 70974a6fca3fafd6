//! Storage error types.

use planroom_common::PlanroomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    #[error("Notification failed: {0}")]
    Notify(String),
}

impl From<StoreError> for PlanroomError {
    fn from(err: StoreError) -> Self {
        PlanroomError::Storage(err.to_string())
    }
}
