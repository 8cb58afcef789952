//! Sync coordinator
//!
//! Drains the pending set against the [`PublishService`], one draft at a
//! time in insertion order. At most one pass runs at any moment; a call made
//! while a pass is active returns [`SyncOutcome::AlreadyRunning`] without
//! touching the queue.
//!
//! A pass works on a snapshot of pending ids taken when it starts. Drafts
//! added mid-pass wait for the next one. Publish failures are recorded on the
//! draft and never abort the pass; there is no in-pass retry and no backoff,
//! so a failed draft gets exactly one attempt per trigger.

use crate::connectivity::Connectivity;
use crate::publish::PublishService;
use crate::queue::DraftQueue;
use crate::types::{DraftId, DraftStatus, Event, SyncOutcome, SyncReport, SyncState};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs sync passes and tracks session state
pub struct SyncCoordinator {
    queue: Arc<DraftQueue>,
    publisher: Arc<dyn PublishService>,
    event_tx: broadcast::Sender<Event>,
    running: Arc<AtomicBool>,
    progress: AtomicU8,
    last_attempt_at: RwLock<Option<DateTime<Utc>>>,
}

/// Claim on the running flag; clears it when dropped, even if the pass
/// future is dropped mid-way or never polled
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncCoordinator {
    /// Create a coordinator over `queue` publishing through `publisher`
    pub fn new(
        queue: Arc<DraftQueue>,
        publisher: Arc<dyn PublishService>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            queue,
            publisher,
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
            progress: AtomicU8::new(0),
            last_attempt_at: RwLock::new(None),
        }
    }

    /// Whether a pass is active
    pub fn is_syncing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Progress of the active or most recent pass (0-100)
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    /// Snapshot of the session state
    pub async fn state(&self) -> SyncState {
        SyncState {
            is_syncing: self.is_syncing(),
            progress: self.progress(),
            last_sync_attempt_at: *self.last_attempt_at.read().await,
        }
    }

    /// Run one sync pass over the current pending set
    ///
    /// Never fails: publish errors land on the drafts. A storage error while
    /// starting an attempt skips that draft; one while settling it is logged
    /// and the settled state is kept in memory.
    pub async fn sync_drafts(&self) -> SyncOutcome {
        let Some(guard) = self.claim() else {
            tracing::debug!("sync requested while a pass is running, ignoring");
            return SyncOutcome::AlreadyRunning;
        };
        SyncOutcome::Completed {
            report: self.run_pass(guard).await,
        }
    }

    fn claim(&self) -> Option<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(self.running.clone()))
    }

    async fn run_pass(&self, guard: RunningGuard) -> SyncReport {
        self.progress.store(0, Ordering::Release);
        *self.last_attempt_at.write().await = Some(Utc::now());

        let snapshot = self.queue.pending_ids().await;
        let total = snapshot.len();

        tracing::info!(pending = total, publisher = self.publisher.name(), "sync pass started");
        self.emit(Event::SyncStarted { pending: total });

        let mut report = SyncReport::default();

        if total == 0 {
            self.progress.store(100, Ordering::Release);
            self.emit(Event::SyncProgress {
                percent: 100,
                completed: 0,
                total: 0,
            });
        }

        for (index, id) in snapshot.into_iter().enumerate() {
            self.attempt(id, &mut report).await;

            let completed = index + 1;
            let percent = (completed * 100 / total) as u8;
            self.progress.store(percent, Ordering::Release);
            self.emit(Event::SyncProgress {
                percent,
                completed,
                total,
            });
        }

        drop(guard);

        tracing::info!(
            attempted = report.attempted,
            uploaded = report.uploaded,
            failed = report.failed,
            "sync pass complete"
        );
        self.emit(Event::SyncCompleted { report });

        report
    }

    async fn attempt(&self, id: DraftId, report: &mut SyncReport) {
        let record = match self.queue.begin_attempt(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(draft_id = %id, "draft left the pending set, skipping");
                return;
            }
            Err(e) => {
                tracing::error!(draft_id = %id, error = %e, "failed to persist upload start, skipping");
                return;
            }
        };

        report.attempted += 1;

        let settled = match self.publisher.publish(&record).await {
            Ok(receipt) => self.queue.mark_uploaded(id, &receipt).await,
            Err(publish_error) => self.queue.mark_failed(id, publish_error.to_string()).await,
        };
        if let Err(e) = settled {
            tracing::error!(draft_id = %id, error = %e, "failed to persist upload result, held in memory until the next write");
        }

        // Count what the queue now holds, not what the publisher returned
        match self.queue.get(id).await.map(|r| r.status) {
            Some(DraftStatus::Uploaded) => report.uploaded += 1,
            Some(DraftStatus::Failed) => report.failed += 1,
            _ => {}
        }
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

/// When the auto-sync watcher triggers a pass
#[derive(Debug, Clone, Copy)]
pub struct AutoSyncOptions {
    /// Sync on every offline-to-online transition
    pub on_reconnect: bool,
    /// Sync once at start if already online
    pub on_start: bool,
}

/// Watch connectivity and trigger passes on reconnect
///
/// Every status change is forwarded as [`Event::ConnectivityChanged`]. Passes
/// run on their own tasks so the watcher keeps observing while one is in
/// flight; overlapping triggers collapse through the at-most-one guard.
pub fn spawn_auto_sync(
    coordinator: Arc<SyncCoordinator>,
    connectivity: Connectivity,
    options: AutoSyncOptions,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut rx = connectivity.subscribe();
    let mut was_online = rx.borrow_and_update().online;

    tokio::spawn(async move {
        if options.on_start && was_online {
            tracing::info!("online at start, triggering sync");
            trigger(&coordinator);
        }

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        // Sender dropped
                        break;
                    }
                    let status = *rx.borrow_and_update();
                    coordinator.emit(Event::ConnectivityChanged { status });

                    if status.online && !was_online && options.on_reconnect {
                        tracing::info!("connectivity restored, triggering sync");
                        trigger(&coordinator);
                    }
                    was_online = status.online;
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("auto-sync watcher stopped");
                    break;
                }
            }
        }
    })
}

/// Start a pass on its own task
///
/// The running flag is claimed before spawning, so `is_syncing` is already
/// true when this returns.
fn trigger(coordinator: &Arc<SyncCoordinator>) {
    let Some(guard) = coordinator.claim() else {
        tracing::debug!("pass already running, trigger ignored");
        return;
    };
    let coordinator = coordinator.clone();
    tokio::spawn(async move {
        coordinator.run_pass(guard).await;
    });
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
