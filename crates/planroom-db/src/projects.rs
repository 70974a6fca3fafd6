//! Project repository.
//!
//! Projects are addressed by their unique name.

use std::sync::Arc;

use chrono::Utc;
use planroom_common::{PlanroomError, Project, ProjectCreate, ProjectUpdate, Result};
use tokio::sync::Mutex;
use tracing::info;

use crate::store::RecordStore;

const NOT_FOUND: &str = "Project not found";

#[derive(Clone)]
pub struct ProjectRepository {
    store: Arc<dyn RecordStore<Project>>,
    /// Serialises name-uniqueness check and insert.
    write_gate: Arc<Mutex<()>>,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn RecordStore<Project>>) -> Self {
        Self { store, write_gate: Arc::new(Mutex::new(())) }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Project>> {
        let mut found = self.store.list(&|p: &Project| p.name == name).await?;
        Ok(found.pop())
    }

    async fn require(&self, name: &str) -> Result<Project> {
        self.find_by_name(name)
            .await?
            .ok_or_else(|| PlanroomError::NotFound(NOT_FOUND.into()))
    }

    pub async fn create(&self, payload: ProjectCreate) -> Result<Project> {
        payload.validate()?;

        let _gate = self.write_gate.lock().await;
        if self.find_by_name(&payload.name).await?.is_some() {
            return Err(PlanroomError::InvalidInput(
                "Project with this name already exists".into(),
            ));
        }
        let project = self.store.insert(payload.into_project(Utc::now())).await?;
        info!(id = project.id, name = %project.name, "Created project");
        Ok(project)
    }

    /// All projects in creation order.
    pub async fn list(&self) -> Result<Vec<Project>> {
        Ok(self.store.list(&|_: &Project| true).await?)
    }

    pub async fn get(&self, name: &str) -> Result<Project> {
        self.require(name).await
    }

    /// Apply the provided fields only; the name is never changed.
    pub async fn update(&self, name: &str, payload: ProjectUpdate) -> Result<Project> {
        payload.validate()?;
        let project = self.require(name).await?;
        let now = Utc::now();
        self.store
            .update(project.id, Box::new(move |p: &mut Project| payload.apply(p, now)))
            .await?
            .ok_or_else(|| PlanroomError::NotFound(NOT_FOUND.into()))
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let project = self.require(name).await?;
        if !self.store.delete(project.id).await? {
            return Err(PlanroomError::NotFound(NOT_FOUND.into()));
        }
        info!(id = project.id, name, "Deleted project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn repo() -> ProjectRepository {
        ProjectRepository::new(Arc::new(MemoryStore::new()))
    }

    fn payload(name: &str) -> ProjectCreate {
        ProjectCreate { name: name.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = repo();
        repo.create(payload("Tower A")).await.unwrap();
        let err = repo.create(payload("Tower A")).await.unwrap_err();
        assert_eq!(err.to_string(), "Project with this name already exists");
    }

    #[tokio::test]
    async fn test_update_only_provided_fields() {
        let repo = repo();
        let created = repo
            .create(ProjectCreate {
                architect: Some("Studio North".into()),
                ..payload("Tower A")
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                "Tower A",
                ProjectUpdate { engineer: Some("Hale Structural".into()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.architect.as_deref(), Some("Studio North"));
        assert_eq!(updated.engineer.as_deref(), Some("Hale Structural"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_missing_project() {
        let repo = repo();
        let err = repo.get("Nope").await.unwrap_err();
        assert!(matches!(err, PlanroomError::NotFound(_)));
        assert_eq!(err.to_string(), "Project not found");
        assert!(repo.delete("Nope").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_then_recreate() {
        let repo = repo();
        repo.create(payload("Tower A")).await.unwrap();
        repo.delete("Tower A").await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.create(payload("Tower A")).await.is_ok());
    }
}
