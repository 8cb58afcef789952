use super::wait_for_event;
use crate::db::Database;
use crate::engine::DraftSyncEngine;
use crate::engine::test_helpers::{FakePublisher, create_test_engine, test_config};
use crate::error::Error;
use crate::queue::INTERRUPTED_MESSAGE;
use crate::store::{KeyValueStore, MemoryStore};
use crate::types::{DraftRecord, DraftStatus, Event, NewDraft};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_shutdown_marks_clean_and_emits_event() {
    let (engine, dir) = create_test_engine().await;
    let mut events = engine.subscribe();

    engine.shutdown().await.unwrap();

    wait_for_event(&mut events, |e| matches!(e, Event::Shutdown)).await;
    assert!(engine.is_shutting_down());

    let config = test_config(dir.path());
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    assert!(!db.was_unclean_shutdown().await.unwrap());
    db.close().await;
}

#[tokio::test]
async fn test_running_engine_reports_unclean_until_shutdown() {
    let (engine, _dir) = create_test_engine().await;
    let db = engine.db.as_ref().unwrap();
    assert!(db.was_unclean_shutdown().await.unwrap());
}

#[tokio::test]
async fn test_add_rejected_after_shutdown() {
    let (engine, _dir) = create_test_engine().await;
    engine.shutdown().await.unwrap();

    let err = engine.add_draft(NewDraft::text("late")).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}

#[tokio::test]
async fn test_mutations_rejected_after_shutdown_closes_database() {
    let (engine, _dir) = create_test_engine().await;
    let id = engine.add_draft(NewDraft::text("kept")).await.unwrap();
    engine.shutdown().await.unwrap();

    assert!(engine.db.as_ref().unwrap().pool().is_closed());

    let err = engine.remove_draft(id).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
    let err = engine.retry_draft(id).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
    let err = engine.clear_uploaded_drafts().await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));

    assert_eq!(engine.draft(id).await.unwrap().status, DraftStatus::Draft);
}

#[tokio::test]
async fn test_drafts_survive_restart() {
    let dir = tempdir().unwrap();

    let first = DraftSyncEngine::with_publisher(test_config(dir.path()), FakePublisher::new())
        .await
        .unwrap();
    let a = first.add_draft(NewDraft::text("a")).await.unwrap();
    let b = first.add_draft(NewDraft::text("b")).await.unwrap();
    let before = first.drafts().await;
    first.shutdown().await.unwrap();
    drop(first);

    let second = DraftSyncEngine::with_publisher(test_config(dir.path()), FakePublisher::new())
        .await
        .unwrap();
    let after = second.drafts().await;

    assert_eq!(after, before);
    assert_eq!(after.iter().map(|d| d.id).collect::<Vec<_>>(), vec![a, b]);
}

#[tokio::test]
async fn test_interrupted_upload_is_failed_on_startup() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let mut interrupted = DraftRecord::new(NewDraft::text("mid-flight"));
    interrupted.status = DraftStatus::Uploading;
    interrupted.retry_count = 1;
    {
        let db = Database::new(&config.persistence.database_path)
            .await
            .unwrap();
        db.put_value(
            &config.persistence.store_key,
            &serde_json::to_string(&vec![interrupted.clone()]).unwrap(),
        )
        .await
        .unwrap();
        db.close().await;
    }

    let engine = DraftSyncEngine::with_publisher(config, FakePublisher::new())
        .await
        .unwrap();

    let record = engine.draft(interrupted.id).await.unwrap();
    assert_eq!(record.status, DraftStatus::Failed);
    assert_eq!(record.error_message.as_deref(), Some(INTERRUPTED_MESSAGE));
    assert_eq!(record.retry_count, 1);
}

#[tokio::test]
async fn test_engine_over_custom_store() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(MemoryStore::new());

    let engine = DraftSyncEngine::with_store(
        test_config(dir.path()),
        backend.clone(),
        FakePublisher::new(),
    )
    .await
    .unwrap();
    assert!(engine.db.is_none());

    engine.add_draft(NewDraft::text("in memory")).await.unwrap();
    engine.shutdown().await.unwrap();

    let stored = backend.get("offline-drafts").await.unwrap().unwrap();
    assert!(stored.contains("in memory"));
    assert!(!dir.path().join("drafts.db").exists());
}

#[tokio::test]
async fn test_zero_reachability_interval_is_rejected() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.connectivity.probe_interval = std::time::Duration::ZERO;

    let result = DraftSyncEngine::with_store(
        config,
        Arc::new(MemoryStore::new()),
        FakePublisher::new(),
    )
    .await;

    match result {
        Err(Error::Config { key, .. }) => {
            assert_eq!(key.as_deref(), Some("connectivity.probe_interval"));
        }
        Err(other) => panic!("expected a config error, got {other}"),
        Ok(_) => panic!("zero reachability interval should be rejected"),
    }
}

#[tokio::test]
async fn test_empty_store_key_is_rejected() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.persistence.store_key = "  ".to_string();

    let result = DraftSyncEngine::with_store(
        config,
        Arc::new(MemoryStore::new()),
        FakePublisher::new(),
    )
    .await;

    match result {
        Err(Error::Config { key, .. }) => {
            assert_eq!(key.as_deref(), Some("persistence.store_key"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("empty store key should be rejected"),
    }
}

#[tokio::test]
async fn test_shutdown_waits_for_nothing_when_idle() {
    let (engine, _dir) = create_test_engine().await;
    engine.add_draft(NewDraft::text("queued")).await.unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(5), engine.shutdown())
        .await
        .expect("idle shutdown should be quick")
        .unwrap();

    assert_eq!(engine.stats().await.draft, 1);
}
