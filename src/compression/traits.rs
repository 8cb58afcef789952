//! Traits and types for per-kind media codecs

use crate::error::CompressionError;
use crate::types::MediaKind;
use async_trait::async_trait;

/// Raw media handed to the pipeline by the caller
#[derive(Debug, Clone)]
pub struct RawMedia {
    /// Caller-supplied reference (file name, picker URI, ...), echoed in the result
    pub original_ref: String,
    /// Declared MIME type, e.g. `image/png`
    pub mime: String,
    /// Unprocessed bytes
    pub data: Vec<u8>,
}

impl RawMedia {
    /// Create a raw media input
    pub fn new(original_ref: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            original_ref: original_ref.into(),
            mime: mime.into(),
            data,
        }
    }

    /// Kind derived from the declared MIME type
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_mime(&self.mime)
    }
}

/// Output of a single codec run
#[must_use]
#[derive(Debug, Clone)]
pub struct EncodedMedia {
    /// Encoded bytes
    pub data: Vec<u8>,
    /// File extension matching the encoded format (without the dot)
    pub extension: String,
}

/// Trait for media codecs
///
/// One implementation exists per [`MediaKind`]. Implementations may be pure
/// Rust or wrap an external binary; either way `encode` must not write
/// anything outside a private scratch area, since spooling the result is the
/// pipeline's job.
#[async_trait]
pub trait MediaCodec: Send + Sync {
    /// Media kind this codec handles
    fn kind(&self) -> MediaKind;

    /// Produce a size-reduced encoding of `media`
    ///
    /// # Errors
    ///
    /// - [`CompressionError::Unreadable`] if the input cannot be decoded
    /// - [`CompressionError::CodecFailed`] if encoding fails
    async fn encode(&self, media: &RawMedia) -> Result<EncodedMedia, CompressionError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
