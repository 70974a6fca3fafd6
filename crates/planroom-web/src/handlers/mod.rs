//! HTTP handlers for all API routes.

pub mod extraction;
pub mod invitations;
pub mod projects;
pub mod system;
pub mod time_tracking;
pub mod uploads;
