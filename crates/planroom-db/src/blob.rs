//! Blob storage for uploaded file contents.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// `None` when no blob is stored under `name`.
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Stored names, sorted.
    async fn list(&self) -> Result<Vec<String>>;
}

/// Blob names are flat file names; anything that could escape the store root
/// is rejected.
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ── Local filesystem ──────────────────────────────────────────────────────────

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(name), bytes).await?;
        debug!(name, bytes = bytes.len(), root = %self.root.display(), "Stored blob");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        check_name(name)?;
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a blob, leaving any record that points at it dangling.
    pub async fn remove(&self, name: &str) -> bool {
        self.blobs.write().await.remove(name).is_some()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        self.blobs.write().await.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.blobs.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert!(check_name("S-101_20240101T000000000000.pdf").is_ok());
        assert!(check_name("../etc/passwd").is_err());
        assert!(check_name("a\\b").is_err());
        assert!(check_name("").is_err());
        assert!(check_name("..").is_err());
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("uploads"));

        assert!(store.list().await.unwrap().is_empty());
        store.put("b.pdf", b"second").await.unwrap();
        store.put("a.pdf", b"first").await.unwrap();

        assert_eq!(store.get("a.pdf").await.unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(store.get("missing.pdf").await.unwrap(), None);
        assert_eq!(store.list().await.unwrap(), vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        assert!(matches!(
            store.put("../escape.pdf", b"x").await,
            Err(StoreError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_remove() {
        let store = MemoryBlobStore::new();
        store.put("a.pdf", b"x").await.unwrap();
        assert!(store.remove("a.pdf").await);
        assert_eq!(store.get("a.pdf").await.unwrap(), None);
    }
}
