//! Time-tracking repository.

use std::sync::Arc;

use chrono::Utc;
use planroom_common::{PlanroomError, Result, TimeEntry};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::store::RecordStore;

const NOT_FOUND: &str = "Time entry not found";
pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 100;
const SUMMARY_RECENT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct TimeSummary {
    pub project_name: String,
    pub total_hours: f64,
    pub active_session: Option<TimeEntry>,
    pub recent_entries: Vec<TimeEntry>,
}

fn newest_first(entries: &mut [TimeEntry]) {
    entries.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
}

fn round_hours(seconds: i64) -> f64 {
    (seconds as f64 / 3600.0 * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct TimeEntryRepository {
    store: Arc<dyn RecordStore<TimeEntry>>,
    /// At most one active entry per user: stop-all and insert happen together.
    write_gate: Arc<Mutex<()>>,
}

impl TimeEntryRepository {
    pub fn new(store: Arc<dyn RecordStore<TimeEntry>>) -> Self {
        Self { store, write_gate: Arc::new(Mutex::new(())) }
    }

    /// Stop every running session for the user, then open a new one.
    pub async fn start(&self, project_name: String, user_email: String) -> Result<TimeEntry> {
        let _gate = self.write_gate.lock().await;
        let now = Utc::now();

        let running = self
            .store
            .list(&|e: &TimeEntry| e.is_active && e.user_email == user_email)
            .await?;
        for entry in running {
            self.store
                .update(entry.id, Box::new(move |e: &mut TimeEntry| e.stop(now)))
                .await?;
            info!(id = entry.id, user = %user_email, "Stopped running time entry");
        }

        let entry = self.store.insert(TimeEntry::start(project_name, user_email, now)).await?;
        info!(id = entry.id, project = %entry.project_name, "Started time entry");
        Ok(entry)
    }

    pub async fn stop(&self, id: i64) -> Result<TimeEntry> {
        let _gate = self.write_gate.lock().await;
        let entry = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PlanroomError::NotFound(NOT_FOUND.into()))?;
        if !entry.is_active {
            return Err(PlanroomError::InvalidInput("Time entry is not active".into()));
        }

        let now = Utc::now();
        self.store
            .update(id, Box::new(move |e: &mut TimeEntry| e.stop(now)))
            .await?
            .ok_or_else(|| PlanroomError::NotFound(NOT_FOUND.into()))
    }

    pub async fn active_for(&self, user_email: &str) -> Result<Option<TimeEntry>> {
        let mut active = self
            .store
            .list(&|e: &TimeEntry| e.is_active && e.user_email == user_email)
            .await?;
        newest_first(&mut active);
        Ok(active.into_iter().next())
    }

    async fn for_project(&self, project_name: &str, user_email: &str) -> Result<Vec<TimeEntry>> {
        let mut entries = self
            .store
            .list(&|e: &TimeEntry| e.project_name == project_name && e.user_email == user_email)
            .await?;
        newest_first(&mut entries);
        Ok(entries)
    }

    /// Entries for one project and user, newest first. `limit` defaults to
    /// [`DEFAULT_LIST_LIMIT`] and is capped at [`MAX_LIST_LIMIT`].
    pub async fn list_for_project(
        &self,
        project_name: &str,
        user_email: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TimeEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        let mut entries = self.for_project(project_name, user_email).await?;
        entries.truncate(limit);
        Ok(entries)
    }

    pub async fn summary(&self, project_name: &str, user_email: &str) -> Result<TimeSummary> {
        let entries = self.for_project(project_name, user_email).await?;
        let total_seconds: i64 = entries.iter().filter_map(|e| e.duration_seconds).sum();
        let active_session = entries.iter().find(|e| e.is_active).cloned();

        Ok(TimeSummary {
            project_name: project_name.to_string(),
            total_hours: round_hours(total_seconds),
            active_session,
            recent_entries: entries.into_iter().take(SUMMARY_RECENT).collect(),
        })
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(PlanroomError::NotFound(NOT_FOUND.into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn repo() -> (TimeEntryRepository, Arc<MemoryStore<TimeEntry>>) {
        let store = Arc::new(MemoryStore::new());
        (TimeEntryRepository::new(store.clone()), store)
    }

    #[test]
    fn test_round_hours() {
        assert_eq!(round_hours(5400), 1.5);
        assert_eq!(round_hours(100), 0.03);
        assert_eq!(round_hours(0), 0.0);
    }

    #[tokio::test]
    async fn test_start_stops_running_entries() {
        let (repo, _) = repo();
        let first = repo.start("Tower A".into(), "jo@x.com".into()).await.unwrap();
        let second = repo.start("Tower B".into(), "jo@x.com".into()).await.unwrap();

        let active = repo.active_for("jo@x.com").await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        let err = repo.stop(first.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Time entry is not active");
    }

    #[tokio::test]
    async fn test_other_users_unaffected() {
        let (repo, _) = repo();
        repo.start("Tower A".into(), "jo@x.com".into()).await.unwrap();
        repo.start("Tower A".into(), "sam@x.com".into()).await.unwrap();
        assert!(repo.active_for("jo@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stop_missing_entry() {
        let (repo, _) = repo();
        assert!(matches!(repo.stop(7).await, Err(PlanroomError::NotFound(_))));
        assert!(matches!(repo.delete(7).await, Err(PlanroomError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_summary_totals_recorded_durations() {
        let (repo, store) = repo();
        let start = Utc::now() - Duration::hours(3);
        for (offset, secs) in [(0, 3600), (1, 1800)] {
            let mut entry = TimeEntry::start("Tower A".into(), "jo@x.com".into(), start + Duration::minutes(offset));
            entry.stop(entry.start_time + Duration::seconds(secs));
            store.insert(entry).await.unwrap();
        }
        let running = repo.start("Tower A".into(), "jo@x.com".into()).await.unwrap();

        let summary = repo.summary("Tower A", "jo@x.com").await.unwrap();
        assert_eq!(summary.total_hours, 1.5);
        assert_eq!(summary.active_session.map(|e| e.id), Some(running.id));
        assert_eq!(summary.recent_entries.len(), 3);
        assert_eq!(summary.recent_entries[0].id, running.id);
    }

    #[tokio::test]
    async fn test_list_limit_capped() {
        let (repo, store) = repo();
        let start = Utc::now();
        for i in 0..120 {
            let mut entry = TimeEntry::start("Tower A".into(), "jo@x.com".into(), start + Duration::seconds(i));
            entry.stop(entry.start_time + Duration::seconds(1));
            store.insert(entry).await.unwrap();
        }
        assert_eq!(repo.list_for_project("Tower A", "jo@x.com", None).await.unwrap().len(), 50);
        let capped = repo.list_for_project("Tower A", "jo@x.com", Some(500)).await.unwrap();
        assert_eq!(capped.len(), 100);
        assert!(capped[0].start_time > capped[1].start_time);
    }
}
