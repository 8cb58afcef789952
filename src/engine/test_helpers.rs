//! Shared test helpers for creating DraftSyncEngine instances in tests.

use crate::config::Config;
use crate::engine::DraftSyncEngine;
use crate::error::PublishError;
use crate::publish::{PublishReceipt, PublishService};
use crate::types::DraftRecord;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

/// Publisher that succeeds unless a draft's content has been marked failing
#[derive(Default)]
pub(crate) struct FakePublisher {
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakePublisher {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_content(&self, content: &str) {
        self.failing.lock().unwrap().insert(content.to_string());
    }

    pub(crate) fn succeed_content(&self, content: &str) {
        self.failing.lock().unwrap().remove(content);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublishService for FakePublisher {
    async fn publish(&self, draft: &DraftRecord) -> Result<PublishReceipt, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&draft.content) {
            return Err(PublishError::Network(format!(
                "unreachable while publishing {}",
                draft.content
            )));
        }
        Ok(PublishReceipt::with_remote_id(format!("post-{}", draft.id)))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Config rooted in `dir`: database and media directory inside it, offline
/// at start, auto-sync on reconnect enabled
pub(crate) fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("drafts.db");
    config.compression.media_dir = dir.join("media");
    config.compression.search_path = false;
    config.connectivity.assume_online = false;
    config
}

/// Helper to create a test engine over a SQLite database in a tempdir.
/// Returns the engine and the tempdir (which must be kept alive).
pub(crate) async fn create_test_engine() -> (DraftSyncEngine, tempfile::TempDir) {
    create_test_engine_with(FakePublisher::new()).await
}

/// Same as [`create_test_engine`] with a caller-held publisher
pub(crate) async fn create_test_engine_with(
    publisher: Arc<FakePublisher>,
) -> (DraftSyncEngine, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let engine = DraftSyncEngine::with_publisher(test_config(temp_dir.path()), publisher)
        .await
        .unwrap();
    (engine, temp_dir)
}
