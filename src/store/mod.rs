//! Persistent draft store
//!
//! Loads and saves the complete draft set through a [`KeyValueStore`]. The
//! whole set is serialized as one JSON array under a single stable key, so
//! every save is a full overwrite.
//!
//! Reads fail soft: a missing key, a substrate read failure, or undecodable
//! data all yield an empty set (logged at `warn`). Writes propagate errors so
//! the queue can refuse to commit a mutation that did not persist.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::KeyValueStore;

use crate::Result;
use crate::error::StorageReadError;
use crate::types::DraftRecord;
use std::sync::Arc;

/// Draft persistence over a key-value substrate
#[derive(Clone)]
pub struct DraftStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl DraftStore {
    /// Create a store that keeps drafts under `key` in `backend`
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Load every persisted draft
    ///
    /// Never fails. Anything that prevents reading a well-formed array is
    /// logged and treated as an empty store.
    pub async fn load_all(&self) -> Vec<DraftRecord> {
        let raw = match self.backend.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no persisted drafts");
                return Vec::new();
            }
            Err(e) => {
                let err = StorageReadError {
                    key: self.key.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!(error = %err, backend = self.backend.name(), "failed to read draft store, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<DraftRecord>>(&raw) {
            Ok(records) => {
                tracing::debug!(key = %self.key, count = records.len(), "loaded persisted drafts");
                records
            }
            Err(e) => {
                let err = StorageReadError {
                    key: self.key.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!(error = %err, "draft store is corrupted, starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the persisted set with `records`
    pub async fn save_all(&self, records: &[DraftRecord]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.backend.put(&self.key, &raw).await?;
        tracing::trace!(key = %self.key, count = records.len(), "saved drafts");
        Ok(())
    }
}


// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::test_support::FlakyStore;
    use super::*;
    use crate::types::{DraftStatus, NewDraft};
    use std::sync::atomic::Ordering;

    const KEY: &str = "offline-drafts";

    #[tokio::test]
    async fn missing_key_loads_empty() {
        let store = DraftStore::new(Arc::new(MemoryStore::new()), KEY);
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let store = DraftStore::new(Arc::new(MemoryStore::new()), KEY);

        let first = DraftRecord::new(NewDraft::text("first"));
        let mut second = DraftRecord::new(NewDraft {
            content: "second".to_string(),
            tags: vec!["travel".to_string()],
            ..Default::default()
        });
        second.status = DraftStatus::Failed;
        second.error_message = Some("timeout".to_string());
        second.retry_count = 2;

        store
            .save_all(&[first.clone(), second.clone()])
            .await
            .unwrap();

        let loaded = store.load_all().await;
        assert_eq!(loaded, vec![first, second]);
    }

    #[tokio::test]
    async fn save_overwrites_previous_set() {
        let store = DraftStore::new(Arc::new(MemoryStore::new()), KEY);

        let a = DraftRecord::new(NewDraft::text("a"));
        let b = DraftRecord::new(NewDraft::text("b"));
        store.save_all(&[a, b.clone()]).await.unwrap();
        store.save_all(&[b.clone()]).await.unwrap();
        store.save_all(&[b.clone()]).await.unwrap();

        assert_eq!(store.load_all().await, vec![b]);
    }

    #[tokio::test]
    async fn malformed_data_loads_empty() {
        let backend = Arc::new(MemoryStore::with_entry(KEY, "{not json"));
        let store = DraftStore::new(backend, KEY);
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn wrong_shape_loads_empty() {
        let backend = Arc::new(MemoryStore::with_entry(KEY, r#"{"drafts":[]}"#));
        let store = DraftStore::new(backend, KEY);
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn read_failure_loads_empty() {
        let backend = Arc::new(FlakyStore::new());
        backend.fail_reads.store(true, Ordering::SeqCst);
        let store = DraftStore::new(backend, KEY);
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn write_failure_propagates() {
        let backend = Arc::new(FlakyStore::new());
        backend.set_fail_writes(true);
        let store = DraftStore::new(backend, KEY);

        let result = store
            .save_all(&[DraftRecord::new(NewDraft::text("x"))])
            .await;
        assert!(result.is_err());
    }
}
