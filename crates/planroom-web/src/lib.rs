//! planroom-web: HTTP surface for the Planroom workspace.
//! Provides:
//!   - PDF title-block extraction (plus debug view and engine status)
//!   - Projects, time tracking and stage uploads
//!   - Workspace invitations
//!   - Health probe

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
