//! Background tasks and shutdown coordination.

use crate::error::Result;
use crate::sync::{AutoSyncOptions, spawn_auto_sync};
use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::DraftSyncEngine;

/// How long shutdown waits for background tasks and an active pass
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl DraftSyncEngine {
    /// Start the auto-sync watcher and, if configured, the connectivity probe
    pub(crate) async fn start_background_tasks(&self) -> Result<()> {
        let connectivity_config = &self.config.connectivity;
        let mut handles = self.background.handles.lock().await;

        handles.push(spawn_auto_sync(
            self.sync.clone(),
            self.connectivity.clone(),
            AutoSyncOptions {
                on_reconnect: connectivity_config.auto_sync,
                on_start: connectivity_config.sync_on_start,
            },
            self.background.cancel.child_token(),
        ));

        if let Some(probe) = self
            .connectivity
            .spawn_probe(connectivity_config, self.background.cancel.child_token())?
        {
            handles.push(probe);
        }

        tracing::debug!(tasks = handles.len(), "background tasks started");
        Ok(())
    }

    /// Gracefully shut down the engine
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting draft mutations
    /// 2. Stops the auto-sync watcher and connectivity probe
    /// 3. Waits for an active sync pass to finish (30 second timeout)
    /// 4. Flushes the draft set to the store
    /// 5. Marks a clean shutdown in the database and closes it
    ///
    /// A pass cannot be interrupted mid-draft, so waiting is the only way to
    /// avoid leaving a draft in `uploading`. If the timeout expires the
    /// in-flight draft is marked `failed` on the next start.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails. The remaining steps still run.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new drafts
        self.accepting_new.store(false, Ordering::SeqCst);

        // 2. Stop background tasks
        self.background.cancel.cancel();
        let handles: Vec<_> = self.background.handles.lock().await.drain(..).collect();
        for handle in handles {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "background task ended abnormally"),
                Err(_) => tracing::warn!("Timeout waiting for background task to stop"),
            }
        }

        // 3. Let an active pass finish
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_sync())
            .await
            .is_err()
        {
            tracing::warn!("Timeout waiting for sync pass to complete, proceeding with shutdown");
        }

        // 4. Persist final state
        let flushed = self.queue.flush().await;
        match &flushed {
            Ok(()) => tracing::info!("Draft queue flushed"),
            Err(e) => tracing::error!(error = %e, "Failed to flush draft queue during shutdown"),
        }

        // 5. Mark clean shutdown in database and release it
        if let Some(db) = &self.db {
            if let Err(e) = db.set_clean_shutdown().await {
                tracing::error!(error = %e, "Failed to mark clean shutdown in database");
            } else {
                tracing::info!("Marked clean shutdown in database");
            }
            db.close().await;
        }

        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        flushed
    }

    /// Whether [`shutdown`](Self::shutdown) has begun
    pub fn is_shutting_down(&self) -> bool {
        !self.accepting_new.load(Ordering::SeqCst)
    }

    async fn wait_for_active_sync(&self) {
        while self.sync.is_syncing() {
            tracing::debug!("Waiting for sync pass to complete");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
