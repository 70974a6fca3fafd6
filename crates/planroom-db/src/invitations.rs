//! Invitation repository.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use planroom_common::{Invitation, InvitationStatus, PlanroomError, Result};
use rand::RngCore;
use serde::Deserialize;
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::store::RecordStore;

const TOKEN_BYTES: usize = 24;
pub const INVITE_SUBJECT: &str = "You're invited to the workspace";

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationCreate {
    pub name: String,
    pub email: String,
    pub designation: String,
    #[serde(default)]
    pub project_name: Option<String>,
}

/// 24 random bytes, base64url without padding.
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn invite_body(name: &str, accept_link: &str) -> String {
    let name = if name.trim().is_empty() { "there" } else { name };
    format!("Hello {name},\n\nYou've been invited to join the workspace.\nAccept: {accept_link}\n")
}

#[derive(Clone)]
pub struct InvitationRepository {
    store: Arc<dyn RecordStore<Invitation>>,
    notifier: Arc<dyn Notifier>,
    app_url: String,
}

impl InvitationRepository {
    pub fn new(store: Arc<dyn RecordStore<Invitation>>, notifier: Arc<dyn Notifier>, app_url: impl Into<String>) -> Self {
        Self { store, notifier, app_url: app_url.into() }
    }

    pub fn accept_link(&self, token: &str) -> String {
        format!("{}/#/accept?token={token}", self.app_url.trim_end_matches('/'))
    }

    /// Record a pending invitation and notify the invitee. Notification
    /// failures are logged only.
    pub async fn invite(&self, payload: InvitationCreate) -> Result<Invitation> {
        let invitation = Invitation {
            id: 0,
            name: payload.name,
            email: payload.email,
            designation: payload.designation,
            token: new_token(),
            status: InvitationStatus::Pending,
            project_name: payload.project_name,
            created_at: Utc::now(),
        };
        let invitation = self.store.insert(invitation).await?;
        info!(id = invitation.id, email = %invitation.email, "Created invitation");

        let body = invite_body(&invitation.name, &self.accept_link(&invitation.token));
        if let Err(e) = self.notifier.notify(&invitation.email, INVITE_SUBJECT, &body).await {
            warn!(id = invitation.id, error = %e, "Invitation notification failed");
        }
        Ok(invitation)
    }

    pub async fn accept(&self, token: &str) -> Result<Invitation> {
        let found = self.store.list(&|i: &Invitation| i.token == token).await?;
        let invitation = found
            .into_iter()
            .next()
            .ok_or_else(|| PlanroomError::NotFound("Invalid token".into()))?;

        self.store
            .update(invitation.id, Box::new(|i: &mut Invitation| i.status = InvitationStatus::Accepted))
            .await?
            .ok_or_else(|| PlanroomError::NotFound("Invalid token".into()))
    }

    /// All invitations, newest first.
    pub async fn list(&self) -> Result<Vec<Invitation>> {
        let mut all = self.store.list(&|_: &Invitation| true).await?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<(String, String, String)>>);

    #[async_trait]
    impl Notifier for Outbox {
        async fn notify(&self, recipient: &str, subject: &str, body: &str) -> crate::error::Result<()> {
            self.0.lock().unwrap().push((recipient.into(), subject.into(), body.into()));
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Notifier for Broken {
        async fn notify(&self, _: &str, _: &str, _: &str) -> crate::error::Result<()> {
            Err(StoreError::Notify("smtp down".into()))
        }
    }

    fn payload() -> InvitationCreate {
        InvitationCreate {
            name: "Sam".into(),
            email: "sam@x.com".into(),
            designation: "Detailer".into(),
            project_name: None,
        }
    }

    #[test]
    fn test_token_shape() {
        let token = new_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, new_token());
    }

    #[tokio::test]
    async fn test_invite_notifies_with_accept_link() {
        let outbox = Arc::new(Outbox::default());
        let repo = InvitationRepository::new(Arc::new(MemoryStore::new()), outbox.clone(), "http://localhost:5173/");

        let inv = repo.invite(payload()).await.unwrap();
        assert_eq!(inv.status, InvitationStatus::Pending);

        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "sam@x.com");
        assert_eq!(sent[0].1, INVITE_SUBJECT);
        assert!(sent[0].2.contains(&format!("http://localhost:5173/#/accept?token={}", inv.token)));
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_invite() {
        let repo = InvitationRepository::new(Arc::new(MemoryStore::new()), Arc::new(Broken), "http://app");
        assert!(repo.invite(payload()).await.is_ok());
    }

    #[tokio::test]
    async fn test_accept() {
        let repo = InvitationRepository::new(Arc::new(MemoryStore::new()), Arc::new(Outbox::default()), "http://app");
        let inv = repo.invite(payload()).await.unwrap();

        let accepted = repo.accept(&inv.token).await.unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);

        let err = repo.accept("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }
}
