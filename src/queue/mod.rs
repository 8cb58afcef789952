//! Draft queue
//!
//! The authoritative in-memory set of drafts and the only writer of the
//! persistent draft store. Every mutation follows the same write-through
//! sequence under one lock:
//!
//! 1. validate against the current state
//! 2. build the next record set
//! 3. persist it with [`DraftStore::save_all`]
//! 4. only then replace the in-memory set and emit the event
//!
//! A failed store write therefore leaves memory untouched and surfaces the
//! error to the caller. The two transitions that settle an upload attempt
//! ([`mark_uploaded`](DraftQueue::mark_uploaded) and
//! [`mark_failed`](DraftQueue::mark_failed)) are the exception: they apply in
//! memory even when the write fails, so a draft never stays `uploading` once
//! its publish call has returned. The next write or [`flush`](DraftQueue::flush)
//! persists the settled state.
//!
//! ## State machine
//!
//! ```text
//! draft ──► uploading ──► uploaded (terminal)
//!   ▲           │
//!   │           ▼
//!   └─retry── failed ──► uploading (next pass)
//! ```

use crate::error::{DraftError, Error};
use crate::publish::PublishReceipt;
use crate::store::DraftStore;
use crate::types::{DraftId, DraftRecord, DraftStats, DraftStatus, DraftUpdate, Event, NewDraft};
use crate::Result;
use std::collections::HashSet;
use tokio::sync::{Mutex, broadcast};

/// Error message recorded on drafts found mid-upload at startup
pub const INTERRUPTED_MESSAGE: &str = "upload interrupted";

/// Owned, persisted queue of drafts
pub struct DraftQueue {
    records: Mutex<Vec<DraftRecord>>,
    store: DraftStore,
    event_tx: broadcast::Sender<Event>,
}

impl DraftQueue {
    /// Create an empty queue writing through to `store`
    ///
    /// Call [`rehydrate`](Self::rehydrate) once before use to load persisted drafts.
    pub fn new(store: DraftStore, event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            store,
            event_tx,
        }
    }

    /// Load persisted drafts into memory, replacing the current set
    ///
    /// Drafts persisted as `uploading` were interrupted by a previous exit and
    /// become `failed`. Duplicate ids keep their first occurrence. If either
    /// fix-up applied, the cleaned set is written back; a failure to do so is
    /// logged and the cleaned set is still used.
    ///
    /// Returns the number of drafts loaded.
    pub async fn rehydrate(&self) -> usize {
        let mut records = self.records.lock().await;
        let loaded = self.store.load_all().await;
        let loaded_count = loaded.len();

        let mut seen = HashSet::with_capacity(loaded_count);
        let mut cleaned = Vec::with_capacity(loaded_count);
        let mut interrupted = 0usize;

        for mut record in loaded {
            if !seen.insert(record.id) {
                tracing::warn!(draft_id = %record.id, "dropping duplicate persisted draft");
                continue;
            }
            if record.status == DraftStatus::Uploading {
                tracing::warn!(draft_id = %record.id, "draft was mid-upload at last exit, marking failed");
                record.status = DraftStatus::Failed;
                record.error_message = Some(INTERRUPTED_MESSAGE.to_string());
                interrupted += 1;
            }
            cleaned.push(record);
        }

        if (interrupted > 0 || cleaned.len() != loaded_count)
            && let Err(e) = self.store.save_all(&cleaned).await
        {
            tracing::error!(error = %e, "failed to persist rehydration fix-ups");
        }

        tracing::info!(
            drafts = cleaned.len(),
            interrupted,
            "draft queue rehydrated"
        );

        let count = cleaned.len();
        *records = cleaned;
        count
    }

    /// Create a draft in `draft` status
    pub async fn add(&self, draft: NewDraft) -> Result<DraftId> {
        let record = DraftRecord::new(draft);
        let id = record.id;

        let mut records = self.records.lock().await;
        let mut next = records.clone();
        next.push(record);
        self.commit(&mut records, next).await?;
        drop(records);

        tracing::info!(draft_id = %id, "draft added");
        self.emit(Event::DraftAdded { id });
        Ok(id)
    }

    /// Apply a partial update to a `draft` or `failed` record
    pub async fn update(&self, id: DraftId, update: DraftUpdate) -> Result<DraftRecord> {
        let mut records = self.records.lock().await;
        let index = find(&records, id)?;
        ensure_state(&records[index], "update", |s| s.is_pending())?;

        let mut next = records.clone();
        next[index].apply(update);
        let updated = next[index].clone();
        self.commit(&mut records, next).await?;
        drop(records);

        tracing::debug!(draft_id = %id, "draft updated");
        self.emit(Event::DraftUpdated { id });
        Ok(updated)
    }

    /// Remove a record in any state except `uploading`
    pub async fn remove(&self, id: DraftId) -> Result<DraftRecord> {
        let mut records = self.records.lock().await;
        let index = find(&records, id)?;
        ensure_state(&records[index], "remove", |s| s != DraftStatus::Uploading)?;

        let mut next = records.clone();
        let removed = next.remove(index);
        self.commit(&mut records, next).await?;
        drop(records);

        tracing::info!(draft_id = %id, "draft removed");
        self.emit(Event::DraftRemoved { id });
        Ok(removed)
    }

    /// Hand a `failed` record back to the pending set
    ///
    /// Clears the error message and keeps the retry count; the next sync
    /// pass makes the actual attempt.
    pub async fn retry(&self, id: DraftId) -> Result<()> {
        let mut records = self.records.lock().await;
        let index = find(&records, id)?;
        ensure_state(&records[index], "retry", |s| s == DraftStatus::Failed)?;

        let mut next = records.clone();
        next[index].status = DraftStatus::Draft;
        next[index].error_message = None;
        self.commit(&mut records, next).await?;
        drop(records);

        tracing::info!(draft_id = %id, "draft queued for retry");
        self.emit(Event::DraftRetried { id });
        Ok(())
    }

    /// Remove every `uploaded` record, returning the removed records
    ///
    /// Nothing is written when no record is `uploaded`.
    pub async fn clear_uploaded(&self) -> Result<Vec<DraftRecord>> {
        let mut records = self.records.lock().await;
        let (removed, next): (Vec<DraftRecord>, Vec<DraftRecord>) = records
            .iter()
            .cloned()
            .partition(|r| r.status == DraftStatus::Uploaded);
        if removed.is_empty() {
            return Ok(removed);
        }
        self.commit(&mut records, next).await?;
        drop(records);

        let count = removed.len();
        tracing::info!(count, "cleared uploaded drafts");
        self.emit(Event::UploadedCleared { count });
        Ok(removed)
    }

    /// Move a pending record to `uploading` and count the attempt
    ///
    /// Returns `Ok(None)` if the record no longer exists or is no longer
    /// pending, so a sync pass can skip it.
    pub async fn begin_attempt(&self, id: DraftId) -> Result<Option<DraftRecord>> {
        let mut records = self.records.lock().await;
        let Some(index) = records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        if !records[index].status.is_pending() {
            return Ok(None);
        }

        let mut next = records.clone();
        let record = &mut next[index];
        record.status = DraftStatus::Uploading;
        record.error_message = None;
        record.retry_count = record.retry_count.saturating_add(1);
        record.last_attempt_at = Some(chrono::Utc::now());
        let attempting = record.clone();
        self.commit(&mut records, next).await?;
        drop(records);

        tracing::debug!(draft_id = %id, attempt = attempting.retry_count, "upload attempt started");
        self.emit(Event::DraftUploading {
            id,
            attempt: attempting.retry_count,
        });
        Ok(Some(attempting))
    }

    /// Record a successful publish for an `uploading` record
    ///
    /// A store error is returned after the record has already moved to
    /// `uploaded` in memory.
    pub async fn mark_uploaded(&self, id: DraftId, receipt: &PublishReceipt) -> Result<()> {
        let mut records = self.records.lock().await;
        let index = find(&records, id)?;
        ensure_state(&records[index], "mark uploaded", |s| {
            s == DraftStatus::Uploading
        })?;

        let mut next = records.clone();
        next[index].status = DraftStatus::Uploaded;
        next[index].error_message = None;
        next[index].remote_id = receipt.remote_id.clone();
        let persisted = self.settle(&mut records, next).await;
        drop(records);

        tracing::info!(draft_id = %id, remote_id = ?receipt.remote_id, "draft uploaded");
        self.emit(Event::DraftUploaded {
            id,
            remote_id: receipt.remote_id.clone(),
        });
        persisted
    }

    /// Record a failed publish for an `uploading` record
    ///
    /// A store error is returned after the record has already moved to
    /// `failed` in memory.
    pub async fn mark_failed(&self, id: DraftId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        let mut records = self.records.lock().await;
        let index = find(&records, id)?;
        ensure_state(&records[index], "mark failed", |s| {
            s == DraftStatus::Uploading
        })?;

        let mut next = records.clone();
        next[index].status = DraftStatus::Failed;
        next[index].error_message = Some(reason.clone());
        let persisted = self.settle(&mut records, next).await;
        drop(records);

        tracing::warn!(draft_id = %id, error = %reason, "draft upload failed");
        self.emit(Event::DraftFailed { id, error: reason });
        persisted
    }

    /// Snapshot of every draft, in insertion order
    pub async fn drafts(&self) -> Vec<DraftRecord> {
        self.records.lock().await.clone()
    }

    /// A single draft by id
    pub async fn get(&self, id: DraftId) -> Option<DraftRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Ids of the pending set (`draft` + `failed`), in insertion order
    pub async fn pending_ids(&self) -> Vec<DraftId> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.status.is_pending())
            .map(|r| r.id)
            .collect()
    }

    /// Counts per status
    pub async fn stats(&self) -> DraftStats {
        let records = self.records.lock().await;
        let mut stats = DraftStats {
            total: records.len(),
            ..Default::default()
        };
        for record in records.iter() {
            match record.status {
                DraftStatus::Draft => stats.draft += 1,
                DraftStatus::Uploading => stats.uploading += 1,
                DraftStatus::Failed => stats.failed += 1,
                DraftStatus::Uploaded => stats.uploaded += 1,
            }
        }
        stats.pending = stats.draft + stats.failed;
        stats
    }

    /// Number of drafts held
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the queue holds no drafts
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Persist the full record set
    ///
    /// Used at shutdown; mutations already write through.
    pub async fn flush(&self) -> Result<()> {
        let records = self.records.lock().await;
        self.store.save_all(&records).await
    }

    async fn commit(&self, current: &mut Vec<DraftRecord>, next: Vec<DraftRecord>) -> Result<()> {
        self.store.save_all(&next).await?;
        *current = next;
        Ok(())
    }

    /// Like `commit`, but memory moves to `next` whether or not the write lands
    async fn settle(&self, current: &mut Vec<DraftRecord>, next: Vec<DraftRecord>) -> Result<()> {
        let persisted = self.store.save_all(&next).await;
        *current = next;
        persisted
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

fn find(records: &[DraftRecord], id: DraftId) -> Result<usize> {
    records
        .iter()
        .position(|r| r.id == id)
        .ok_or(Error::Draft(DraftError::NotFound { id }))
}

fn ensure_state(
    record: &DraftRecord,
    operation: &str,
    allowed: impl Fn(DraftStatus) -> bool,
) -> Result<()> {
    if allowed(record.status) {
        return Ok(());
    }
    Err(Error::Draft(DraftError::InvalidState {
        id: record.id,
        operation: operation.to_string(),
        current_state: record.status.to_string(),
    }))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
