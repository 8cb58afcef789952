//! Common test utilities for draft-sync integration tests

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;
use draft_sync::{Config, DraftSyncEngine, Event};
use tokio::sync::broadcast;

/// Config rooted at `dir` that publishes to `endpoint`
///
/// Starts offline with no probe, so tests drive connectivity explicitly.
pub fn test_config(dir: &Path, endpoint: &str) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = dir.join("drafts.db");
    config.compression.media_dir = dir.join("media");
    config.compression.search_path = false;
    config.publish.endpoint = Some(endpoint.parse().expect("endpoint should be a valid URL"));
    config.publish.timeout = Duration::from_secs(5);
    config.connectivity.assume_online = false;
    config
}

/// Create an engine over `test_config`
pub async fn create_engine(dir: &Path, endpoint: &str) -> DraftSyncEngine {
    DraftSyncEngine::new(test_config(dir, endpoint))
        .await
        .expect("engine should start")
}

/// Wait for the first event matching `pred`
pub async fn wait_for_event<F>(events: &mut broadcast::Receiver<Event>, mut pred: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Wait for the next `SyncCompleted` event
pub async fn wait_for_sync(events: &mut broadcast::Receiver<Event>) -> Event {
    wait_for_event(events, |e| matches!(e, Event::SyncCompleted { .. })).await
}
