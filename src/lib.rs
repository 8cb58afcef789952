//! # draft-sync
//!
//! Offline draft queue and sync engine for a social publishing client.
//!
//! ## Design Philosophy
//!
//! draft-sync is designed to be:
//! - **Offline-first** - Drafts are persisted before anything touches the network
//! - **Crash-safe** - An upload interrupted by a crash is reported as failed, never lost
//! - **Library-first** - Embed the engine directly, or expose it over the REST API
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use draft_sync::{Config, DraftSyncEngine, NewDraft};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.publish.endpoint = Some("https://api.example.com/v1/posts".parse()?);
//!
//!     let engine = DraftSyncEngine::new(config).await?;
//!
//!     // Subscribe to events
//!     let mut events = engine.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Queued while offline; published on the next sync pass
//!     engine.add_draft(NewDraft::text("written on the train")).await?;
//!     engine.connectivity().set_online(true);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Media compression pipeline
pub mod compression;
/// Configuration types
pub mod config;
/// Connectivity observation
pub mod connectivity;
/// Database persistence layer
pub mod db;
/// Engine facade (decomposed into focused submodules)
pub mod engine;
/// Error types
pub mod error;
/// Publish service abstraction
pub mod publish;
/// Draft queue
pub mod queue;
/// Key-value storage backends
pub mod store;
/// Sync coordination
pub mod sync;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use compression::{CompressedMedia, CompressionPipeline, CompressionProgress, RawMedia};
pub use config::{
    ApiConfig, CompressionConfig, Config, ConnectivityConfig, PersistenceConfig, PublishConfig,
};
pub use connectivity::Connectivity;
pub use db::Database;
pub use engine::DraftSyncEngine;
pub use error::{
    ApiError, CompressionError, DatabaseError, DraftError, Error, ErrorDetail, PublishError,
    Result, ToHttpStatus,
};
pub use publish::{HttpPublisher, PublishReceipt, PublishService};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{
    ConnectionType, ConnectivityStatus, DraftId, DraftMedia, DraftRecord, DraftStats,
    DraftStatus, DraftUpdate, Event, MediaKind, NewDraft, SyncOutcome, SyncReport, SyncState,
};

/// Helper function to run the engine with graceful signal handling.
///
/// Waits for a termination signal and then calls the engine's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use draft_sync::{Config, DraftSyncEngine, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let engine = DraftSyncEngine::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(engine).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(engine: DraftSyncEngine) -> Result<()> {
    wait_for_signal().await;
    engine.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
