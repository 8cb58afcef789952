//! Key-value document storage.

use crate::error::DatabaseError;
use crate::store::KeyValueStore;
use crate::{Error, Result};
use async_trait::async_trait;

use super::Database;

impl Database {
    /// Get the value stored under `key`
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to read key {}: {}",
                    key, e
                )))
            })?;

        Ok(value)
    }

    /// Insert or replace the value stored under `key`
    pub async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to write key {}: {}",
                key, e
            )))
        })?;

        Ok(())
    }

    /// Delete `key` if present
    pub async fn delete_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete key {}: {}",
                    key, e
                )))
            })?;

        Ok(())
    }

    /// Last write time of `key` as a unix timestamp
    pub async fn value_updated_at(&self, key: &str) -> Result<Option<i64>> {
        let updated_at: Option<i64> =
            sqlx::query_scalar("SELECT updated_at FROM kv_store WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to read timestamp for key {}: {}",
                        key, e
                    )))
                })?;

        Ok(updated_at)
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.put_value(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.delete_value(key).await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
