//! In-process `CommentStore` with switchable failures, for exercising the
//! error paths the SQL store cannot be made to hit on demand.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use super::CommentStore;
use crate::error::StoreError;
use crate::models::{CommentRecord, NewComment};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CommentRecord>>,
    next_id: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_delete_by_parent: AtomicBool,
    pub fail_delete_by_id: AtomicBool,
    pub list_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
    /// When set, inserts wait for a notification before completing.
    pub insert_gate: Option<Notify>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            insert_gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn with_records(records: Vec<CommentRecord>) -> Self {
        let store = Self::new();
        store.next_id.store(records.len(), Ordering::SeqCst);
        *store.records.lock().unwrap() = records;
        store
    }

    pub fn ids(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.lock().unwrap().iter().any(|r| r.id == id)
    }
}

/// A record whose `created_at` is `t` seconds after a fixed epoch.
pub fn record(id: &str, parent: Option<&str>, t: i64) -> CommentRecord {
    let created_at: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(t);
    CommentRecord {
        id: id.to_string(),
        recipe_id: "recipe".to_string(),
        parent_comment_id: parent.map(str::to_string),
        author_name: None,
        comment_text: format!("comment {id}"),
        created_at,
        updated_at: created_at,
    }
}

fn unavailable(op: &str) -> StoreError {
    StoreError::Unavailable(format!("{op} failed"))
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn list_comments(&self, recipe_id: &str) -> Result<Vec<CommentRecord>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable("list"));
        }

        let mut rows: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.recipe_id == recipe_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.insert_gate {
            gate.notified().await;
        }
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(unavailable("insert"));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let record = CommentRecord {
            id: format!("c{n}"),
            recipe_id: comment.recipe_id,
            parent_comment_id: comment.parent_comment_id,
            author_name: comment.author_name,
            comment_text: comment.comment_text,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn delete_comments_by_parent(&self, parent_comment_id: &str) -> Result<(), StoreError> {
        if self.fail_delete_by_parent.load(Ordering::SeqCst) {
            return Err(unavailable("delete replies"));
        }
        self.records
            .lock()
            .unwrap()
            .retain(|r| r.parent_comment_id.as_deref() != Some(parent_comment_id));
        Ok(())
    }

    async fn delete_comment_by_id(&self, comment_id: &str) -> Result<(), StoreError> {
        if self.fail_delete_by_id.load(Ordering::SeqCst) {
            return Err(unavailable("delete comment"));
        }
        self.records.lock().unwrap().retain(|r| r.id != comment_id);
        Ok(())
    }
}
