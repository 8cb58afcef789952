//! Bitmap re-encoding codec built on the `image` crate

use super::traits::{EncodedMedia, MediaCodec, RawMedia};
use crate::error::CompressionError;
use crate::types::MediaKind;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageEncoder, ImageReader};
use std::io::Cursor;

/// Re-encodes still images as JPEG, downscaled to a maximum edge length
///
/// If the re-encoded image is not smaller than the input, the original bytes
/// are returned unchanged so compression never grows a payload.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    max_dimension: u32,
    quality: u8,
}

impl ImageCodec {
    /// Create a codec with the given size limit and JPEG quality (clamped to 1-100)
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(1, 100),
        }
    }
}

#[async_trait]
impl MediaCodec for ImageCodec {
    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    async fn encode(&self, media: &RawMedia) -> Result<EncodedMedia, CompressionError> {
        let data = media.data.clone();
        let original_ref = media.original_ref.clone();
        let max_dimension = self.max_dimension;
        let quality = self.quality;

        // Decoding and resampling are CPU-bound
        tokio::task::spawn_blocking(move || {
            reencode(&data, &original_ref, max_dimension, quality)
        })
        .await
        .map_err(|e| CompressionError::CodecFailed {
            original_ref: media.original_ref.clone(),
            reason: format!("image task panicked: {}", e),
        })?
    }

    fn name(&self) -> &'static str {
        "image-jpeg"
    }
}

fn reencode(
    data: &[u8],
    original_ref: &str,
    max_dimension: u32,
    quality: u8,
) -> Result<EncodedMedia, CompressionError> {
    let unreadable = |reason: String| CompressionError::Unreadable {
        original_ref: original_ref.to_string(),
        reason,
    };

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| unreadable(e.to_string()))?;
    let source_format = reader.format();
    let img = reader.decode().map_err(|e| unreadable(e.to_string()))?;

    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CompressionError::CodecFailed {
            original_ref: original_ref.to_string(),
            reason: e.to_string(),
        })?;

    if output.len() >= data.len() {
        let extension = source_format
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or(MediaKind::Image.extension());
        tracing::debug!(
            original_ref,
            size_before = data.len(),
            reencoded = output.len(),
            "re-encoded image is not smaller, keeping original"
        );
        return Ok(EncodedMedia {
            data: data.to_vec(),
            extension: extension.to_string(),
        });
    }

    Ok(EncodedMedia {
        data: output,
        extension: MediaKind::Image.extension().to_string(),
    })
}
