use super::*;
use crate::connectivity::Connectivity;
use crate::sync::{AutoSyncOptions, spawn_auto_sync};
use crate::types::{ConnectivityStatus, DraftStatus, NewDraft, SyncReport};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ALL_TRIGGERS: AutoSyncOptions = AutoSyncOptions {
    on_reconnect: true,
    on_start: true,
};

/// Wait for the next SyncCompleted event
async fn next_completed(events: &mut broadcast::Receiver<Event>) -> SyncReport {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Event::SyncCompleted { report } = events.recv().await.unwrap() {
                return report;
            }
        }
    })
    .await
    .expect("sync pass should complete")
}

#[tokio::test]
async fn test_reconnect_triggers_sync() {
    let mut h = harness(ScriptedPublisher::new());
    let id = h.queue.add(NewDraft::text("queued offline")).await.unwrap();

    let connectivity = Connectivity::default();
    let cancel = CancellationToken::new();
    let handle = spawn_auto_sync(
        h.coordinator.clone(),
        connectivity.clone(),
        ALL_TRIGGERS,
        cancel.clone(),
    );

    connectivity.set_online(true);

    let report = next_completed(&mut h.events).await;
    assert_eq!(report.uploaded, 1);
    assert_eq!(h.queue.get(id).await.unwrap().status, DraftStatus::Uploaded);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_connectivity_changes_are_forwarded() {
    let mut h = harness(ScriptedPublisher::new());
    let connectivity = Connectivity::default();
    let cancel = CancellationToken::new();
    let options = AutoSyncOptions {
        on_reconnect: false,
        on_start: false,
    };
    let handle = spawn_auto_sync(h.coordinator.clone(), connectivity.clone(), options, cancel.clone());

    connectivity.set_online(true);

    let event = tokio::time::timeout(Duration::from_secs(5), h.events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        event,
        Event::ConnectivityChanged {
            status: ConnectivityStatus { online: true, .. }
        }
    ));

    // Reconnect trigger disabled: no pass ran
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.coordinator.state().await.last_sync_attempt_at.is_none());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_sync_on_start_when_already_online() {
    let mut h = harness(ScriptedPublisher::new());
    h.queue.add(NewDraft::text("from last session")).await.unwrap();

    let connectivity = Connectivity::default();
    connectivity.set_online(true);

    let cancel = CancellationToken::new();
    let handle = spawn_auto_sync(h.coordinator.clone(), connectivity, ALL_TRIGGERS, cancel.clone());

    let report = next_completed(&mut h.events).await;
    assert_eq!(report.attempted, 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_going_offline_does_not_trigger() {
    let h = harness(ScriptedPublisher::new());
    h.queue.add(NewDraft::text("waiting")).await.unwrap();

    let connectivity = Connectivity::default();
    let cancel = CancellationToken::new();
    let options = AutoSyncOptions {
        on_reconnect: true,
        on_start: false,
    };
    let handle = spawn_auto_sync(h.coordinator.clone(), connectivity.clone(), options, cancel.clone());

    connectivity.set_connection(false, crate::types::ConnectionType::Cellular);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(h.publisher.calls().is_empty());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_trigger_claims_the_pass_before_spawning() {
    let mut h = harness(ScriptedPublisher::gated());
    h.queue.add(NewDraft::text("a")).await.unwrap();

    crate::sync::trigger(&h.coordinator);

    // Claimed synchronously, before the spawned task has been polled
    assert!(h.coordinator.is_syncing());
    assert_eq!(
        h.coordinator.sync_drafts().await,
        crate::types::SyncOutcome::AlreadyRunning
    );
    crate::sync::trigger(&h.coordinator);

    h.publisher.wait_entered().await;
    h.publisher.release(1);
    let report = next_completed(&mut h.events).await;

    assert_eq!(report.uploaded, 1);
    assert!(!h.coordinator.is_syncing());
    assert_eq!(h.publisher.calls().len(), 1);
}
