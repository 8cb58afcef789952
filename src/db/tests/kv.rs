use crate::db::*;
use crate::store::KeyValueStore;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_get_missing_key_returns_none() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    assert!(db.get_value("nope").await.unwrap().is_none());
    assert!(db.value_updated_at("nope").await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_put_overwrites_existing_value() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.put_value("offline-drafts", r#"[{"a":1}]"#).await.unwrap();
    db.put_value("offline-drafts", "[]").await.unwrap();

    assert_eq!(
        db.get_value("offline-drafts").await.unwrap().as_deref(),
        Some("[]")
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert!(db.value_updated_at("offline-drafts").await.unwrap().is_some());

    db.close().await;
}

#[tokio::test]
async fn test_delete_value() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.put_value("k", "v").await.unwrap();
    db.delete_value("k").await.unwrap();
    assert!(db.get_value("k").await.unwrap().is_none());

    // Deleting again is not an error
    db.delete_value("k").await.unwrap();

    db.close().await;
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let temp_file = NamedTempFile::new().unwrap();

    {
        let db = Database::new(temp_file.path()).await.unwrap();
        db.put_value("offline-drafts", "persisted").await.unwrap();
        db.close().await;
    }

    let db = Database::new(temp_file.path()).await.unwrap();
    assert_eq!(
        db.get_value("offline-drafts").await.unwrap().as_deref(),
        Some("persisted")
    );

    db.close().await;
}

#[tokio::test]
async fn test_key_value_store_trait_delegates() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let store: &dyn KeyValueStore = &db;

    store.put("k", "v").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    store.delete("k").await.unwrap();
    assert!(store.get("k").await.unwrap().is_none());
    assert_eq!(store.name(), "sqlite");

    db.close().await;
}

#[tokio::test]
async fn test_write_after_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    db.close().await;

    let result = db.put_value("k", "v").await;
    assert!(result.is_err(), "writing to a closed pool should fail");
}
