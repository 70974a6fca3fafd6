//! Workspace record stores.
//!
//! One `RecordStore` per record type, handed out to the repositories.

use std::sync::Arc;

use planroom_common::{Invitation, Project, TimeEntry, UploadedFile};

use crate::blob::BlobStore;
use crate::invitations::InvitationRepository;
use crate::notify::Notifier;
use crate::projects::ProjectRepository;
use crate::store::{MemoryStore, RecordStore};
use crate::time_entries::TimeEntryRepository;
use crate::uploads::UploadRepository;

/// Main storage handle.
#[derive(Clone)]
pub struct Database {
    projects: Arc<dyn RecordStore<Project>>,
    time_entries: Arc<dyn RecordStore<TimeEntry>>,
    uploads: Arc<dyn RecordStore<UploadedFile>>,
    invitations: Arc<dyn RecordStore<Invitation>>,
}

impl Database {
    /// All record types kept in process memory.
    pub fn in_memory() -> Self {
        Self {
            projects: Arc::new(MemoryStore::<Project>::new()),
            time_entries: Arc::new(MemoryStore::<TimeEntry>::new()),
            uploads: Arc::new(MemoryStore::<UploadedFile>::new()),
            invitations: Arc::new(MemoryStore::<Invitation>::new()),
        }
    }

    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.projects.clone())
    }

    pub fn time_entries(&self) -> TimeEntryRepository {
        TimeEntryRepository::new(self.time_entries.clone())
    }

    pub fn uploads(&self, blobs: Arc<dyn BlobStore>) -> UploadRepository {
        UploadRepository::new(self.uploads.clone(), blobs)
    }

    pub fn invitations(&self, notifier: Arc<dyn Notifier>, app_url: &str) -> InvitationRepository {
        InvitationRepository::new(self.invitations.clone(), notifier, app_url)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::in_memory()
    }
}
