//! Planroom storage layer.
//!
//! Record, blob and notification boundaries plus the workspace repositories
//! built on them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use planroom_db::{Database, LocalBlobStore};
//!
//! let db = Database::in_memory();
//! let projects = db.projects();
//! let uploads = db.uploads(Arc::new(LocalBlobStore::new("./uploads")));
//! ```

pub mod blob;
pub mod database;
pub mod error;
pub mod invitations;
pub mod notify;
pub mod projects;
pub mod store;
pub mod time_entries;
pub mod uploads;

pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore};
pub use database::Database;
pub use error::{Result, StoreError};
pub use invitations::{InvitationCreate, InvitationRepository};
pub use notify::{LogNotifier, Notifier};
pub use projects::ProjectRepository;
pub use store::{MemoryStore, Record, RecordStore};
pub use time_entries::{TimeEntryRepository, TimeSummary};
pub use uploads::{UploadRepository, UploadTarget};
