//! planroom-common: Shared record types and errors used across all planroom crates.

pub mod error;
pub mod entities;

// Re-export commonly used types
pub use entities::{
    Invitation, InvitationStatus, Project, ProjectCreate, ProjectUpdate, TimeEntry, UploadedFile,
};
pub use error::{PlanroomError, Result};
