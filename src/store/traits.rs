//! Persistence substrate abstraction

use async_trait::async_trait;

/// Durable key-value map the draft store persists through
///
/// Values are opaque strings. Implementations must make a successful
/// [`put`](KeyValueStore::put) visible to every later [`get`](KeyValueStore::get),
/// including after a process restart for durable backends.
///
/// # Examples
///
/// ```no_run
/// use draft_sync::store::{KeyValueStore, MemoryStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.put("offline-drafts", "[]").await?;
/// assert_eq!(store.get("offline-drafts").await?.as_deref(), Some("[]"));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    async fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str) -> crate::Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
