//! Session store interfaces and their in-memory implementations.
//!
//! The stores replace what used to be process-global dictionaries: callers
//! receive them as explicit `Arc<dyn ...>` collaborators, so the orchestrator
//! and advisor stay free of global state and tests can substitute their own.
//!
//! Lifecycle policy: entries live for the lifetime of the store. There is no
//! expiry and nothing deletes entries implicitly; a session uploaded once is
//! readable until the process (or the store) goes away.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::model::{BatchRecord, UploadedLedger};

/// Keyed storage for uploaded ledgers, one per session id.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Stores (or replaces) the ledger for a session.
    async fn put(&self, session_id: &str, ledger: UploadedLedger);

    /// Returns a copy of the session's ledger, if one was uploaded.
    async fn get(&self, session_id: &str) -> Option<UploadedLedger>;

    async fn contains(&self, session_id: &str) -> bool;
}

/// Keyed storage for live batch progress records.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Stores (or replaces) the batch record for a session. The orchestrator
    /// calls this after every processed account, so readers always see the
    /// latest snapshot.
    async fn put(&self, session_id: &str, record: BatchRecord);

    /// Returns a copy of the session's batch record.
    async fn get(&self, session_id: &str) -> Option<BatchRecord>;

    async fn contains(&self, session_id: &str) -> bool;
}

/// Process-memory [`UploadStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryUploadStore {
    inner: Arc<RwLock<HashMap<String, UploadedLedger>>>,
}

impl InMemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadStore for InMemoryUploadStore {
    async fn put(&self, session_id: &str, ledger: UploadedLedger) {
        self.inner.write().await.insert(session_id.to_string(), ledger);
    }

    async fn get(&self, session_id: &str) -> Option<UploadedLedger> {
        self.inner.read().await.get(session_id).cloned()
    }

    async fn contains(&self, session_id: &str) -> bool {
        self.inner.read().await.contains_key(session_id)
    }
}

/// Process-memory [`BatchStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryBatchStore {
    inner: Arc<RwLock<HashMap<String, BatchRecord>>>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn put(&self, session_id: &str, record: BatchRecord) {
        self.inner.write().await.insert(session_id.to_string(), record);
    }

    async fn get(&self, session_id: &str) -> Option<BatchRecord> {
        self.inner.read().await.get(session_id).cloned()
    }

    async fn contains(&self, session_id: &str) -> bool {
        self.inner.read().await.contains_key(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::mapping::BatchStatus;

    fn ledger(filename: &str) -> UploadedLedger {
        UploadedLedger::new(
            filename,
            vec![Account::new("1000", "Cash")],
            vec!["Account_Code".to_string()],
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn put_get_contains_round_trip() {
        let store = InMemoryUploadStore::new();

        assert!(!store.contains("s1").await);
        assert_eq!(store.get("s1").await, None);

        store.put("s1", ledger("a.csv")).await;

        assert!(store.contains("s1").await);
        assert_eq!(store.get("s1").await.unwrap().filename, "a.csv");
    }

    #[tokio::test]
    async fn put_replaces_existing_entry() {
        let store = InMemoryUploadStore::new();
        store.put("s1", ledger("old.csv")).await;
        store.put("s1", ledger("new.csv")).await;

        assert_eq!(store.get("s1").await.unwrap().filename, "new.csv");
    }

    #[tokio::test]
    async fn entries_never_expire() {
        let store = InMemoryUploadStore::new();
        store.put("s1", ledger("a.csv")).await;

        // Arbitrarily many reads and unrelated writes later, the entry is
        // still there: lifetime is the store's lifetime, by policy.
        for i in 0..100 {
            store.put(&format!("other-{i}"), ledger("b.csv")).await;
            assert!(store.contains("s1").await);
        }
    }

    #[tokio::test]
    async fn batch_records_snapshot_latest_state() {
        let store = InMemoryBatchStore::new();
        let mut record = BatchRecord::new(3);
        store.put("batch", record.clone()).await;

        record.processed_accounts = 2;
        store.put("batch", record.clone()).await;

        let read = store.get("batch").await.unwrap();
        assert_eq!(read.processed_accounts, 2);
        assert_eq!(read.status, BatchStatus::Processing);
    }

    #[tokio::test]
    async fn stores_are_cheaply_shareable() {
        let store = InMemoryUploadStore::new();
        let clone = store.clone();

        store.put("s1", ledger("a.csv")).await;

        // Clones share the same map.
        assert!(clone.contains("s1").await);
    }
}
