//! Uploaded-file repository: blob contents plus their records.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use planroom_common::{PlanroomError, Result, UploadedFile};
use tracing::{info, warn};

use crate::blob::BlobStore;
use crate::store::RecordStore;

pub const STAGES: std::ops::RangeInclusive<u8> = 1..=11;
const MAX_STEM_CHARS: usize = 80;

/// Where an upload belongs.
#[derive(Debug, Clone, Default)]
pub struct UploadTarget {
    pub stage: u8,
    pub dp_id: Option<i64>,
    pub project_name: Option<String>,
    pub user_email: Option<String>,
}

pub fn check_stage(stage: u8) -> Result<()> {
    if !STAGES.contains(&stage) {
        return Err(PlanroomError::InvalidInput(format!(
            "stage must be between {} and {}",
            STAGES.start(),
            STAGES.end()
        )));
    }
    Ok(())
}

/// `<sanitised stem>_<timestamp><ext>`. The stem keeps alphanumerics, `-`
/// and `_`, truncated to 80 characters; an empty stem becomes `file`.
pub fn stored_name(original: &str, now: DateTime<Utc>) -> String {
    let path = Path::new(original);
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let safe: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_STEM_CHARS)
        .collect();
    let safe = if safe.is_empty() { "file".to_string() } else { safe };
    format!("{safe}_{}{ext}", now.format("%Y%m%dT%H%M%S%6f"))
}

#[derive(Clone)]
pub struct UploadRepository {
    store: Arc<dyn RecordStore<UploadedFile>>,
    blobs: Arc<dyn BlobStore>,
}

impl UploadRepository {
    pub fn new(store: Arc<dyn RecordStore<UploadedFile>>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Store the bytes and record them under `target`.
    pub async fn save(&self, original_name: &str, bytes: &[u8], target: &UploadTarget) -> Result<UploadedFile> {
        check_stage(target.stage)?;
        let now = Utc::now();
        let stored = stored_name(original_name, now);
        self.blobs.put(&stored, bytes).await?;

        let record = UploadedFile {
            id: 0,
            original_name: if original_name.is_empty() { stored.clone() } else { original_name.to_string() },
            stored_name: stored,
            size: bytes.len() as u64,
            stage: target.stage,
            dp_id: target.dp_id,
            project_name: target.project_name.clone(),
            user_email: target.user_email.clone(),
            created_at: now,
        };
        let record = self.store.insert(record).await?;
        info!(id = record.id, stored = %record.stored_name, size = record.size, stage = record.stage, "Stored upload");
        Ok(record)
    }

    /// Records for `stage`, optionally narrowed by design-package id and
    /// project, newest first.
    pub async fn list(&self, stage: u8, dp_id: Option<i64>, project_name: Option<&str>) -> Result<Vec<UploadedFile>> {
        check_stage(stage)?;
        let project_name = project_name.filter(|p| !p.is_empty());
        let mut files = self
            .store
            .list(&|f: &UploadedFile| {
                f.stage == stage
                    && dp_id.map_or(true, |d| f.dp_id == Some(d))
                    && project_name.map_or(true, |p| f.project_name.as_deref() == Some(p))
            })
            .await?;
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(files)
    }

    /// The record and its stored bytes.
    pub async fn download(&self, id: i64) -> Result<(UploadedFile, Vec<u8>)> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PlanroomError::NotFound("File not found".into()))?;
        match self.blobs.get(&record.stored_name).await? {
            Some(bytes) => Ok((record, bytes)),
            None => {
                warn!(id, stored = %record.stored_name, "Upload record has no stored blob");
                Err(PlanroomError::NotFound("Stored file missing".into()))
            }
        }
    }
}
