//! Shared record of whether the inference service is reachable.
//!
//! One `EngineAvailability` is created per process and handed to every
//! component that needs it. The state only changes through [`EngineAvailability::refresh`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::LlmBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Unknown,
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilitySnapshot {
    pub state: EngineState,
    pub checked_at: Option<DateTime<Utc>>,
    pub model_count: usize,
}

pub struct EngineAvailability {
    inner: RwLock<AvailabilitySnapshot>,
}

impl Default for EngineAvailability {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAvailability {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(AvailabilitySnapshot {
                state: EngineState::Unknown,
                checked_at: None,
                model_count: 0,
            }),
        }
    }

    pub async fn status(&self) -> AvailabilitySnapshot {
        self.inner.read().await.clone()
    }

    pub async fn is_available(&self) -> bool {
        self.inner.read().await.state == EngineState::Available
    }

    /// List models on `backend` and record the outcome. An error or an empty
    /// listing marks the engine unavailable.
    pub async fn refresh(&self, backend: &dyn LlmBackend) -> EngineState {
        let (state, model_count) = match backend.list_models().await {
            Ok(models) if !models.is_empty() => {
                info!(models = models.len(), model = %backend.model_id(), "Inference service available");
                (EngineState::Available, models.len())
            }
            Ok(_) => {
                warn!("Inference service reachable but reports no models");
                (EngineState::Unavailable, 0)
            }
            Err(e) => {
                warn!(error = %e, "Inference service not reachable");
                (EngineState::Unavailable, 0)
            }
        };

        let mut guard = self.inner.write().await;
        *guard = AvailabilitySnapshot { state, checked_at: Some(Utc::now()), model_count };
        state
    }

    /// Refresh only if no check has completed yet, then report availability.
    pub async fn ensure_checked(&self, backend: &dyn LlmBackend) -> bool {
        let state = self.inner.read().await.state;
        match state {
            EngineState::Unknown => self.refresh(backend).await == EngineState::Available,
            other => other == EngineState::Available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LlmError, LlmRequest, LlmResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ListingBackend {
        models: Option<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ListingBackend {
        fn new(models: Option<Vec<&str>>) -> Self {
            Self {
                models: models.map(|m| m.into_iter().map(str::to_string).collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for ListingBackend {
        async fn complete(&self, _req: LlmRequest) -> Result<LlmResponse, LlmError> {
            Err(LlmError::Unavailable("not scripted".into()))
        }
        async fn list_models(&self) -> Result<Vec<String>, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.models
                .clone()
                .ok_or_else(|| LlmError::Unavailable("connection refused".into()))
        }
        fn model_id(&self) -> &str { "mistral:latest" }
        fn is_local(&self) -> bool { true }
    }

    #[tokio::test]
    async fn test_starts_unknown() {
        let avail = EngineAvailability::new();
        let snap = avail.status().await;
        assert_eq!(snap.state, EngineState::Unknown);
        assert!(snap.checked_at.is_none());
        assert!(!avail.is_available().await);
    }

    #[tokio::test]
    async fn test_refresh_with_models_is_available() {
        let avail = EngineAvailability::new();
        let backend = ListingBackend::new(Some(vec!["mistral:latest"]));
        assert_eq!(avail.refresh(&backend).await, EngineState::Available);
        assert!(avail.is_available().await);
        assert_eq!(avail.status().await.model_count, 1);
    }

    #[tokio::test]
    async fn test_refresh_with_no_models_is_unavailable() {
        let avail = EngineAvailability::new();
        let backend = ListingBackend::new(Some(vec![]));
        assert_eq!(avail.refresh(&backend).await, EngineState::Unavailable);
    }

    #[tokio::test]
    async fn test_listing_error_is_unavailable() {
        let avail = EngineAvailability::new();
        let backend = ListingBackend::new(None);
        assert_eq!(avail.refresh(&backend).await, EngineState::Unavailable);
        assert!(avail.status().await.checked_at.is_some());
    }

    #[tokio::test]
    async fn test_ensure_checked_lists_only_once() {
        let avail = EngineAvailability::new();
        let backend = ListingBackend::new(None);
        assert!(!avail.ensure_checked(&backend).await);
        assert!(!avail.ensure_checked(&backend).await);
        assert!(!avail.ensure_checked(&backend).await);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_refresh_can_recover() {
        let avail = EngineAvailability::new();
        avail.refresh(&ListingBackend::new(None)).await;
        assert!(!avail.is_available().await);
        avail.refresh(&ListingBackend::new(Some(vec!["mistral:latest"]))).await;
        assert!(avail.is_available().await);
    }
}
