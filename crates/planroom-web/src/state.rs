//! Shared application state for the web server.

use std::sync::Arc;

use planroom_db::{BlobStore, Database, InvitationRepository, Notifier, ProjectRepository, TimeEntryRepository, UploadRepository};
use planroom_extraction::ExtractionPipeline;
use planroom_llm::{EngineAvailability, LlmBackend};

use crate::config::Config;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub backend: Arc<dyn LlmBackend>,
    pub availability: Arc<EngineAvailability>,
    pub pipeline: ExtractionPipeline,
    pub projects: ProjectRepository,
    pub time_entries: TimeEntryRepository,
    pub uploads: UploadRepository,
    pub invitations: InvitationRepository,
}

impl AppState {
    pub fn new(
        config: &Config,
        backend: Arc<dyn LlmBackend>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let availability = Arc::new(EngineAvailability::new());
        let pipeline = ExtractionPipeline::new(backend.clone(), availability.clone(), config.extraction.clone());
        let db = Database::in_memory();

        Self {
            backend,
            availability,
            pipeline,
            projects: db.projects(),
            time_entries: db.time_entries(),
            uploads: db.uploads(blobs),
            invitations: db.invitations(notifier, &config.server.app_url),
        }
    }
}

pub type SharedState = Arc<AppState>;
