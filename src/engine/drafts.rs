//! Draft creation, edits, removal and reads.

use crate::compression::{CompressedMedia, CompressionProgress, RawMedia};
use crate::error::{DraftError, Error, Result};
use crate::types::{DraftId, DraftMedia, DraftRecord, DraftStats, DraftUpdate, NewDraft};
use std::sync::atomic::Ordering;

use super::DraftSyncEngine;

impl DraftSyncEngine {
    /// Queue a new draft in `draft` status
    ///
    /// The draft is persisted before this returns; it is published by the
    /// next sync pass.
    ///
    /// Attached media must be a payload produced by the compression pipeline,
    /// i.e. a file inside the media directory.
    ///
    /// # Errors
    ///
    /// [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown) has begun,
    /// [`DraftError::ForeignMedia`] for media outside the media directory, or
    /// a storage error if the draft could not be persisted.
    pub async fn add_draft(&self, draft: NewDraft) -> Result<DraftId> {
        self.ensure_accepting()?;
        if let Some(media) = &draft.media {
            self.ensure_spooled(media).await?;
        }
        self.queue.add(draft).await
    }

    /// Compress `media`, attach it to `draft`, and queue the draft
    ///
    /// `on_progress` receives compression progress. If compression fails no
    /// draft is created; if persisting the draft fails the compressed payload
    /// is deleted again.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use draft_sync::{Config, DraftSyncEngine, NewDraft, RawMedia};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let engine = DraftSyncEngine::new(Config::default()).await?;
    /// let bytes = tokio::fs::read("photo.png").await?;
    ///
    /// let id = engine
    ///     .add_draft_with_media(
    ///         NewDraft::text("sunset"),
    ///         RawMedia::new("photo.png", "image/png", bytes),
    ///         |p| println!("compressing: {}%", p.percent),
    ///     )
    ///     .await?;
    /// println!("queued draft {id}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_draft_with_media<F>(
        &self,
        mut draft: NewDraft,
        media: RawMedia,
        on_progress: F,
    ) -> Result<DraftId>
    where
        F: FnMut(CompressionProgress) + Send,
    {
        self.ensure_accepting()?;

        let compressed = self
            .compression
            .compress(vec![media], on_progress)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other("compression produced no output".to_string()))?;

        let attached = compressed.to_draft_media();
        draft.media = Some(attached.clone());

        match self.queue.add(draft).await {
            Ok(id) => {
                tracing::debug!(
                    draft_id = %id,
                    size_before = compressed.size_before,
                    size_after = compressed.size_after,
                    "draft queued with compressed media"
                );
                Ok(id)
            }
            Err(e) => {
                self.release_media(&attached).await;
                Err(e)
            }
        }
    }

    /// Compress a batch of media without creating a draft
    ///
    /// The payloads stay in the media directory; attach them to drafts with
    /// [`CompressedMedia::to_draft_media`].
    pub async fn compress_media<F>(
        &self,
        files: Vec<RawMedia>,
        on_progress: F,
    ) -> Result<Vec<CompressedMedia>>
    where
        F: FnMut(CompressionProgress) + Send,
    {
        Ok(self.compression.compress(files, on_progress).await?)
    }

    /// Edit a draft in `draft` or `failed` status
    ///
    /// New media is subject to the same check as in
    /// [`add_draft`](Self::add_draft). When the update replaces the media, the
    /// previous payload is deleted from the media directory.
    pub async fn update_draft(&self, id: DraftId, update: DraftUpdate) -> Result<DraftRecord> {
        self.ensure_accepting()?;
        if let Some(Some(media)) = &update.media {
            self.ensure_spooled(media).await?;
        }

        let replaced_media = match &update.media {
            Some(_) => self.queue.get(id).await.and_then(|r| r.media),
            None => None,
        };

        let updated = self.queue.update(id, update).await?;

        if let Some(previous) = replaced_media
            && updated.media.as_ref() != Some(&previous)
        {
            self.release_media(&previous).await;
        }

        Ok(updated)
    }

    /// Delete a draft that is not currently uploading
    pub async fn remove_draft(&self, id: DraftId) -> Result<DraftRecord> {
        self.ensure_accepting()?;
        let removed = self.queue.remove(id).await?;
        if let Some(media) = &removed.media {
            self.release_media(media).await;
        }
        Ok(removed)
    }

    /// Hand a `failed` draft back to the pending set
    ///
    /// The attempt itself happens on the next sync pass.
    pub async fn retry_draft(&self, id: DraftId) -> Result<()> {
        self.ensure_accepting()?;
        self.queue.retry(id).await
    }

    /// Remove every `uploaded` draft, returning how many were removed
    pub async fn clear_uploaded_drafts(&self) -> Result<usize> {
        self.ensure_accepting()?;
        let removed = self.queue.clear_uploaded().await?;
        for media in removed.iter().filter_map(|r| r.media.as_ref()) {
            self.release_media(media).await;
        }
        Ok(removed.len())
    }

    /// All drafts in insertion order
    pub async fn drafts(&self) -> Vec<DraftRecord> {
        self.queue.drafts().await
    }

    /// A single draft
    pub async fn draft(&self, id: DraftId) -> Option<DraftRecord> {
        self.queue.get(id).await
    }

    /// Draft counts by status
    pub async fn stats(&self) -> DraftStats {
        self.queue.stats().await
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.accepting_new.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::ShuttingDown)
        }
    }

    async fn ensure_spooled(&self, media: &DraftMedia) -> Result<()> {
        match self.compression.resolve(&media.reference).await {
            Some(_) => Ok(()),
            None => Err(DraftError::ForeignMedia {
                reference: media.reference.clone(),
            }
            .into()),
        }
    }

    /// Delete a payload the pipeline spooled; anything that does not resolve
    /// inside the media directory is left alone
    async fn release_media(&self, media: &DraftMedia) {
        let Some(path) = self.compression.resolve(&media.reference).await else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "released media payload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to delete media payload");
            }
        }
    }
}
