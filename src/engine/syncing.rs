//! Sync passes, session state and connectivity.

use crate::connectivity::Connectivity;
use crate::types::{ConnectivityStatus, SyncOutcome, SyncState};

use super::DraftSyncEngine;

impl DraftSyncEngine {
    /// Publish every pending draft once, in insertion order
    ///
    /// Returns [`SyncOutcome::AlreadyRunning`] without doing anything if a
    /// pass is already active. Per-draft publish failures are recorded on the
    /// drafts and summarized in the report; they never fail this call.
    pub async fn sync_drafts(&self) -> SyncOutcome {
        self.sync.sync_drafts().await
    }

    /// Whether a sync pass is active
    pub fn is_syncing(&self) -> bool {
        self.sync.is_syncing()
    }

    /// Progress of the active or most recent pass (0-100)
    pub fn sync_progress(&self) -> u8 {
        self.sync.progress()
    }

    /// Snapshot of the sync session
    pub async fn sync_state(&self) -> SyncState {
        self.sync.state().await
    }

    /// The connectivity observer
    ///
    /// Hosts that track the network themselves push changes through it; an
    /// offline-to-online transition triggers a sync pass when
    /// `connectivity.auto_sync` is enabled.
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Replace the connectivity status; returns `true` if it changed
    pub fn set_connectivity(&self, status: ConnectivityStatus) -> bool {
        self.connectivity.set_status(status)
    }
}
