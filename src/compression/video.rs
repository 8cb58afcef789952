//! Video transcoding via an external ffmpeg binary

use super::traits::{EncodedMedia, MediaCodec, RawMedia};
use crate::config::CompressionConfig;
use crate::error::CompressionError;
use crate::types::MediaKind;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Transcodes video to H.264/AAC MP4 using the `ffmpeg` binary
///
/// # Examples
///
/// ```no_run
/// use draft_sync::compression::FfmpegCodec;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let codec = FfmpegCodec::new(PathBuf::from("/usr/bin/ffmpeg"), 720, 28);
///
/// // Or auto-discover from PATH
/// let codec = FfmpegCodec::from_path(720, 28).expect("ffmpeg not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    binary_path: PathBuf,
    max_height: u32,
    crf: u8,
}

impl FfmpegCodec {
    /// Create a codec with an explicit binary path
    pub fn new(binary_path: PathBuf, max_height: u32, crf: u8) -> Self {
        Self {
            binary_path,
            max_height: max_height.max(2),
            // x264 CRF range
            crf: crf.min(51),
        }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path(max_height: u32, crf: u8) -> Option<Self> {
        which::which("ffmpeg")
            .ok()
            .map(|path| Self::new(path, max_height, crf))
    }

    /// Resolve the codec from configuration
    ///
    /// An explicit `ffmpeg_path` wins; otherwise PATH is searched when
    /// `search_path` is set. `None` means videos cannot be compressed.
    pub fn from_config(config: &CompressionConfig) -> Option<Self> {
        if let Some(path) = &config.ffmpeg_path {
            return Some(Self::new(
                path.clone(),
                config.video_max_height,
                config.video_crf,
            ));
        }
        if config.search_path {
            return Self::from_path(config.video_max_height, config.video_crf);
        }
        None
    }

    /// Path of the ffmpeg binary in use
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn scale_filter(&self) -> String {
        // Never upscale; -2 keeps the width even as libx264 requires
        format!("scale=-2:'min({},ih)'", self.max_height)
    }
}

#[async_trait]
impl MediaCodec for FfmpegCodec {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    async fn encode(&self, media: &RawMedia) -> Result<EncodedMedia, CompressionError> {
        let scratch = std::env::temp_dir();
        let stem = format!("draft-sync-{}", uuid::Uuid::new_v4());
        let input_path = scratch.join(format!("{stem}.in"));
        let output_path = scratch.join(format!("{stem}.mp4"));

        tokio::fs::write(&input_path, &media.data)
            .await
            .map_err(|e| CompressionError::CodecFailed {
                original_ref: media.original_ref.clone(),
                reason: format!("failed to write scratch input: {}", e),
            })?;

        let result = self.transcode(media, &input_path, &output_path).await;

        for path in [&input_path, &output_path] {
            if let Err(e) = tokio::fs::remove_file(path).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch file");
            }
        }

        result
    }

    fn name(&self) -> &'static str {
        "ffmpeg-h264"
    }
}

impl FfmpegCodec {
    async fn transcode(
        &self,
        media: &RawMedia,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<EncodedMedia, CompressionError> {
        let output = Command::new(&self.binary_path)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .arg("-i")
            .arg(input_path)
            .args(["-c:v", "libx264", "-preset", "veryfast"])
            .args(["-crf", &self.crf.to_string()])
            .args(["-vf", &self.scale_filter()])
            .args(["-c:a", "aac", "-b:a", "128k"])
            .args(["-movflags", "+faststart"])
            .arg("-y")
            .arg(output_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CompressionError::CodecFailed {
                original_ref: media.original_ref.clone(),
                reason: format!("failed to execute ffmpeg: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // ffmpeg reports undecodable input on stderr with a non-zero exit
            return Err(CompressionError::Unreadable {
                original_ref: media.original_ref.clone(),
                reason: format!("ffmpeg failed: {}", stderr.trim()),
            });
        }

        let data =
            tokio::fs::read(output_path)
                .await
                .map_err(|e| CompressionError::CodecFailed {
                    original_ref: media.original_ref.clone(),
                    reason: format!("failed to read ffmpeg output: {}", e),
                })?;

        Ok(EncodedMedia {
            data,
            extension: MediaKind::Video.extension().to_string(),
        })
    }
}
