//! Media compression pipeline
//!
//! Turns raw media into size-reduced payloads before a draft is queued.
//! Each input is routed to the [`MediaCodec`] for its kind, and the encoded
//! bytes are spooled into the media directory under a fresh reference.
//!
//! Batches are all-or-nothing: the first failure aborts the batch and any
//! payloads already spooled for it are deleted.

mod bitmap;
mod traits;
mod video;

pub use bitmap::ImageCodec;
pub use traits::{EncodedMedia, MediaCodec, RawMedia};
pub use video::FfmpegCodec;

use crate::config::CompressionConfig;
use crate::error::CompressionError;
use crate::types::{DraftMedia, MediaKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use utoipa::ToSchema;

/// Progress notification emitted after each file completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompressionProgress {
    /// Byte-weighted share of the batch completed so far (0-100)
    pub percent: u8,
    /// Index of the file that just completed
    pub file_index: usize,
    /// Number of files in the batch
    pub total_files: usize,
}

/// A compressed, spooled payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompressedMedia {
    /// Reference supplied with the raw input
    pub original_ref: String,
    /// Fresh reference identifying the compressed payload
    pub compressed_ref: String,
    /// Image or video
    pub kind: MediaKind,
    /// Input size in bytes
    pub size_before: u64,
    /// Output size in bytes
    pub size_after: u64,
    /// Where the payload was spooled
    #[schema(value_type = String)]
    pub path: PathBuf,
}

impl CompressedMedia {
    /// Media reference suitable for attaching to a draft
    pub fn to_draft_media(&self) -> DraftMedia {
        DraftMedia {
            reference: self.path.to_string_lossy().into_owned(),
            kind: self.kind,
            size_bytes: self.size_after,
        }
    }
}

/// Routes raw media to per-kind codecs and spools the results
#[derive(Clone)]
pub struct CompressionPipeline {
    media_dir: PathBuf,
    image: Arc<dyn MediaCodec>,
    video: Option<Arc<dyn MediaCodec>>,
}

impl CompressionPipeline {
    /// Build the pipeline from configuration
    ///
    /// Videos are only supported when an ffmpeg binary can be resolved.
    pub fn new(config: &CompressionConfig) -> Self {
        let image: Arc<dyn MediaCodec> = Arc::new(ImageCodec::new(
            config.max_image_dimension,
            config.image_quality,
        ));
        let video = FfmpegCodec::from_config(config).map(|codec| {
            tracing::info!(binary = %codec.binary_path().display(), "video compression enabled");
            Arc::new(codec) as Arc<dyn MediaCodec>
        });
        if video.is_none() {
            tracing::info!("ffmpeg not found, video compression unavailable");
        }

        Self::with_codecs(config.media_dir.clone(), image, video)
    }

    /// Build the pipeline from explicit codecs
    pub fn with_codecs(
        media_dir: PathBuf,
        image: Arc<dyn MediaCodec>,
        video: Option<Arc<dyn MediaCodec>>,
    ) -> Self {
        Self {
            media_dir,
            image,
            video,
        }
    }

    /// Directory compressed payloads are written to
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Resolve a media reference to a payload spooled in the media directory
    ///
    /// See [`resolve_spooled`].
    pub async fn resolve(&self, reference: &str) -> Option<PathBuf> {
        resolve_spooled(&self.media_dir, reference).await
    }

    /// Whether a codec is available for `kind`
    pub fn supports(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Image => true,
            MediaKind::Video => self.video.is_some(),
        }
    }

    /// Compress a batch of raw media
    ///
    /// `on_progress` is called once per completed file with a byte-weighted
    /// percentage that never decreases and reaches 100 on the last file.
    /// The result preserves input order.
    ///
    /// # Errors
    ///
    /// Fails on the first file that is of an unsupported kind, unreadable, or
    /// rejected by its codec. Nothing from the batch remains on disk.
    pub async fn compress<F>(
        &self,
        files: Vec<RawMedia>,
        mut on_progress: F,
    ) -> Result<Vec<CompressedMedia>, CompressionError>
    where
        F: FnMut(CompressionProgress) + Send,
    {
        if files.is_empty() {
            return Err(CompressionError::EmptyBatch);
        }

        // Validate kinds up front so an unsupported file fails before any codec work
        let mut kinds = Vec::with_capacity(files.len());
        for file in &files {
            let kind = file.kind().ok_or_else(|| CompressionError::UnsupportedKind {
                original_ref: file.original_ref.clone(),
                mime: file.mime.clone(),
            })?;
            kinds.push(kind);
        }

        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .map_err(|e| CompressionError::SpoolFailed {
                path: self.media_dir.clone(),
                reason: e.to_string(),
            })?;

        let total_files = files.len();
        let total_bytes: u64 = files.iter().map(|f| f.data.len() as u64).sum();
        let mut completed_bytes: u64 = 0;
        let mut results: Vec<CompressedMedia> = Vec::with_capacity(total_files);

        for (index, (file, kind)) in files.iter().zip(kinds).enumerate() {
            match self.compress_one(file, kind).await {
                Ok(compressed) => {
                    tracing::debug!(
                        original_ref = %compressed.original_ref,
                        compressed_ref = %compressed.compressed_ref,
                        size_before = compressed.size_before,
                        size_after = compressed.size_after,
                        "compressed media"
                    );
                    results.push(compressed);
                }
                Err(e) => {
                    tracing::warn!(
                        original_ref = %file.original_ref,
                        error = %e,
                        spooled = results.len(),
                        "compression failed, aborting batch"
                    );
                    discard_spooled(&results).await;
                    return Err(e);
                }
            }

            completed_bytes += file.data.len() as u64;
            on_progress(CompressionProgress {
                percent: batch_percent(completed_bytes, total_bytes, index + 1, total_files),
                file_index: index,
                total_files,
            });
        }

        Ok(results)
    }

    async fn compress_one(
        &self,
        file: &RawMedia,
        kind: MediaKind,
    ) -> Result<CompressedMedia, CompressionError> {
        if file.data.is_empty() {
            return Err(CompressionError::Unreadable {
                original_ref: file.original_ref.clone(),
                reason: "empty input".to_string(),
            });
        }

        let codec = match kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => {
                self.video
                    .as_ref()
                    .ok_or_else(|| CompressionError::CodecUnavailable {
                        kind: kind.to_string(),
                    })?
            }
        };

        let encoded = codec.encode(file).await?;

        let compressed_ref = uuid::Uuid::new_v4().to_string();
        let path = self
            .media_dir
            .join(format!("{}.{}", compressed_ref, encoded.extension));

        tokio::fs::write(&path, &encoded.data)
            .await
            .map_err(|e| CompressionError::SpoolFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(CompressedMedia {
            original_ref: file.original_ref.clone(),
            compressed_ref,
            kind,
            size_before: file.data.len() as u64,
            size_after: encoded.data.len() as u64,
            path,
        })
    }
}

/// Resolve `reference` to a regular file inside `media_dir`
///
/// Both paths are canonicalized first, so `..` segments and symlinks cannot
/// point outside the directory. Returns `None` for anything that does not
/// exist or lives elsewhere.
pub async fn resolve_spooled(media_dir: &Path, reference: &str) -> Option<PathBuf> {
    let root = tokio::fs::canonicalize(media_dir).await.ok()?;
    let path = tokio::fs::canonicalize(reference).await.ok()?;
    if path == root || !path.starts_with(&root) {
        return None;
    }
    let metadata = tokio::fs::metadata(&path).await.ok()?;
    metadata.is_file().then_some(path)
}

fn batch_percent(
    completed_bytes: u64,
    total_bytes: u64,
    completed_files: usize,
    total_files: usize,
) -> u8 {
    let percent = if total_bytes == 0 {
        completed_files * 100 / total_files.max(1)
    } else {
        (completed_bytes.saturating_mul(100) / total_bytes) as usize
    };
    percent.min(100) as u8
}

async fn discard_spooled(results: &[CompressedMedia]) {
    for media in results {
        if let Err(e) = tokio::fs::remove_file(&media.path).await {
            tracing::warn!(path = %media.path.display(), error = %e, "failed to discard spooled media");
        }
    }
}
