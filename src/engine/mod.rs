//! Engine facade split into focused submodules.
//!
//! [`DraftSyncEngine`] wires the compression pipeline, draft queue, sync
//! coordinator, and connectivity observer together. Its methods are organized
//! by domain:
//! - [`drafts`] - Draft creation, edits, removal and reads
//! - [`syncing`] - Sync passes, session state and connectivity
//! - [`lifecycle`] - Background tasks and shutdown coordination

mod drafts;
mod lifecycle;
mod syncing;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::compression::CompressionPipeline;
use crate::config::Config;
use crate::connectivity::Connectivity;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::publish::{HttpPublisher, PublishService, UnconfiguredPublisher};
use crate::queue::DraftQueue;
use crate::store::{DraftStore, KeyValueStore};
use crate::sync::SyncCoordinator;
use crate::types::Event;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Size of the event broadcast buffer
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Background task bookkeeping
#[derive(Clone, Default)]
pub(crate) struct BackgroundTasks {
    /// Cancels the auto-sync watcher and connectivity probe
    pub(crate) cancel: CancellationToken,
    /// Handles awaited at shutdown
    pub(crate) handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

/// Main engine instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct DraftSyncEngine {
    /// SQLite database, when the engine opened one itself
    ///
    /// `None` for engines built over a caller-supplied store with
    /// [`with_store`](Self::with_store).
    pub db: Option<Arc<Database>>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Authoritative draft set
    pub(crate) queue: Arc<DraftQueue>,
    /// Sync pass runner
    pub(crate) sync: Arc<SyncCoordinator>,
    /// Media compression
    pub(crate) compression: CompressionPipeline,
    /// Current connectivity
    pub(crate) connectivity: Connectivity,
    /// Auto-sync watcher and probe
    pub(crate) background: BackgroundTasks,
    /// Whether new drafts are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl DraftSyncEngine {
    /// Create a new engine from configuration
    ///
    /// Opens (or creates) the SQLite database at `persistence.database_path`,
    /// rehydrates the draft queue, and starts the auto-sync watcher and the
    /// connectivity probe as configured. Drafts are published over HTTP when
    /// `publish.endpoint` is set; otherwise every attempt fails with an
    /// explanatory message until an endpoint is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the HTTP client
    /// cannot be built.
    pub async fn new(config: Config) -> Result<Self> {
        let publisher: Arc<dyn PublishService> = match HttpPublisher::from_config(
            &config.publish,
            &config.compression.media_dir,
        )? {
            Some(http) => {
                tracing::info!(endpoint = %http.endpoint(), "publishing drafts over HTTP");
                Arc::new(http)
            }
            None => {
                tracing::warn!("no publish endpoint configured, sync attempts will fail");
                Arc::new(UnconfiguredPublisher)
            }
        };

        Self::with_publisher(config, publisher).await
    }

    /// Create an engine over the configured database with a custom publisher
    pub async fn with_publisher(config: Config, publisher: Arc<dyn PublishService>) -> Result<Self> {
        let db = Database::new(&config.persistence.database_path).await?;

        match db.was_unclean_shutdown().await {
            Ok(true) => {
                tracing::warn!("previous session did not shut down cleanly");
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read shutdown state");
            }
        }

        // Mark that we're starting up (for unclean shutdown detection)
        db.set_clean_start().await?;

        let db = Arc::new(db);
        let backend: Arc<dyn KeyValueStore> = db.clone();
        Self::assemble(config, backend, publisher, Some(db)).await
    }

    /// Create an engine over a caller-supplied key-value store
    ///
    /// No database is opened, so unclean shutdown detection is skipped.
    pub async fn with_store(
        config: Config,
        backend: Arc<dyn KeyValueStore>,
        publisher: Arc<dyn PublishService>,
    ) -> Result<Self> {
        Self::assemble(config, backend, publisher, None).await
    }

    async fn assemble(
        config: Config,
        backend: Arc<dyn KeyValueStore>,
        publisher: Arc<dyn PublishService>,
        db: Option<Arc<Database>>,
    ) -> Result<Self> {
        if config.persistence.store_key.trim().is_empty() {
            return Err(Error::Config {
                message: "store key must not be empty".to_string(),
                key: Some("persistence.store_key".to_string()),
            });
        }

        if config.connectivity.probe_interval.is_zero() {
            return Err(Error::Config {
                message: "probe interval must be greater than zero".to_string(),
                key: Some("connectivity.probe_interval".to_string()),
            });
        }

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let store = DraftStore::new(backend.clone(), config.persistence.store_key.clone());
        let queue = Arc::new(DraftQueue::new(store, event_tx.clone()));
        queue.rehydrate().await;

        let sync = Arc::new(SyncCoordinator::new(
            queue.clone(),
            publisher.clone(),
            event_tx.clone(),
        ));

        let engine = Self {
            db,
            event_tx,
            compression: CompressionPipeline::new(&config.compression),
            connectivity: Connectivity::from_config(&config.connectivity),
            config: Arc::new(config),
            queue,
            sync,
            background: BackgroundTasks::default(),
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        engine.start_background_tasks().await?;

        tracing::info!(
            store = backend.name(),
            publisher = publisher.name(),
            "draft sync engine started"
        );

        Ok(engine)
    }

    /// Subscribe to engine events
    ///
    /// Returns a receiver that will receive all future events emitted by the
    /// engine. Multiple subscribers can exist simultaneously, and each receives
    /// all events independently. A subscriber that falls more than 1000 events
    /// behind receives `RecvError::Lagged` and skips ahead.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use draft_sync::{Config, DraftSyncEngine, Event};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let engine = DraftSyncEngine::new(Config::default()).await?;
    ///
    ///     let mut events = engine.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             if let Event::DraftFailed { id, error } = event {
    ///                 eprintln!("draft {id} failed: {error}");
    ///             }
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// The media compression pipeline
    pub fn compression(&self) -> &CompressionPipeline {
        &self.compression
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
