//! Record storage.
//!
//! `RecordStore` is the CRUD boundary every repository is written against.
//! `MemoryStore` keeps records in a `BTreeMap` keyed by a sequential id.

use std::collections::BTreeMap;

use async_trait::async_trait;
use planroom_common::{Invitation, Project, TimeEntry, UploadedFile};
use tokio::sync::RwLock;

use crate::error::Result;

/// A record with a store-assigned integer id.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

macro_rules! impl_record {
    ($($ty:ty),+) => {
        $(
            impl Record for $ty {
                fn id(&self) -> i64 {
                    self.id
                }

                fn set_id(&mut self, id: i64) {
                    self.id = id;
                }
            }
        )+
    };
}

impl_record!(Project, TimeEntry, UploadedFile, Invitation);

pub type Mutation<T> = Box<dyn FnOnce(&mut T) + Send>;

#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Store `record` under the next id and return it with the id set.
    async fn insert(&self, record: T) -> Result<T>;

    async fn get(&self, id: i64) -> Result<Option<T>>;

    /// Apply `mutation` in place. `None` when no record has `id`.
    async fn update(&self, id: i64, mutation: Mutation<T>) -> Result<Option<T>>;

    /// Remove the record, returning whether it existed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Records matching `filter`, in id order.
    async fn list(&self, filter: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> Result<Vec<T>>;
}

struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

pub struct MemoryStore<T> {
    table: RwLock<Table<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self { table: RwLock::new(Table { next_id: 1, rows: BTreeMap::new() }) }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn insert(&self, mut record: T) -> Result<T> {
        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;
        record.set_id(id);
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<T>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn update(&self, id: i64, mutation: Mutation<T>) -> Result<Option<T>> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|record| {
            mutation(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn list(&self, filter: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> Result<Vec<T>> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|r| filter(*r)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(email: &str) -> TimeEntry {
        TimeEntry::start("Tower A".into(), email.into(), Utc::now())
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::<TimeEntry>::new();
        let a = store.insert(entry("a@x.com")).await.unwrap();
        let b = store.insert(entry("b@x.com")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.get(2).await.unwrap().unwrap().user_email, "b@x.com");
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::<TimeEntry>::new();
        store.insert(entry("a@x.com")).await.unwrap();
        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
        let next = store.insert(entry("b@x.com")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let store = MemoryStore::<TimeEntry>::new();
        store.insert(entry("a@x.com")).await.unwrap();
        store.insert(entry("b@x.com")).await.unwrap();

        let stopped = store
            .update(1, Box::new(|e: &mut TimeEntry| e.stop(Utc::now())))
            .await
            .unwrap()
            .unwrap();
        assert!(!stopped.is_active);
        assert!(store.update(99, Box::new(|_: &mut TimeEntry| {})).await.unwrap().is_none());

        let active = store.list(&|e: &TimeEntry| e.is_active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_email, "b@x.com");
    }
}
