//! Error types for draft-sync
//!
//! This module provides the error taxonomy for the library:
//! - Domain-specific error types (Draft, Compression, Publish, Storage)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::DraftId;

/// Result type alias for draft-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for draft-sync
///
/// Errors local to a single draft's upload (publish failures) never surface
/// through this type from a sync pass; they are recorded on the draft instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "media_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Draft-related error (invalid state, unknown id)
    #[error("draft error: {0}")]
    Draft(#[from] DraftError),

    /// Media compression failed
    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    /// Publishing a draft failed
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new drafts
    #[error("shutdown in progress: not accepting new drafts")]
    ShuttingDown,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Draft queue errors
#[derive(Debug, Error)]
pub enum DraftError {
    /// Draft not found in the queue
    #[error("draft {id} not found")]
    NotFound {
        /// The draft ID that was not found
        id: DraftId,
    },

    /// Cannot perform operation in current state
    #[error("cannot {operation} draft {id} in state {current_state}")]
    InvalidState {
        /// The draft ID that is in an invalid state for the operation
        id: DraftId,
        /// The operation that was attempted (e.g., "update", "remove", "retry")
        operation: String,
        /// The current state that prevents the operation (e.g., "uploading")
        current_state: String,
    },

    /// Attached media is not a payload in the media directory
    #[error("media {reference} is not a compressed payload in the media directory")]
    ForeignMedia {
        /// The rejected media reference
        reference: String,
    },
}

/// Media compression errors
///
/// Any of these aborts the whole batch being compressed.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The MIME type is neither an image nor a video
    #[error("unsupported media kind {mime} for {original_ref}")]
    UnsupportedKind {
        /// Caller-supplied reference to the raw input
        original_ref: String,
        /// Declared MIME type
        mime: String,
    },

    /// The input could not be read or decoded
    #[error("unreadable media {original_ref}: {reason}")]
    Unreadable {
        /// Caller-supplied reference to the raw input
        original_ref: String,
        /// The reason decoding failed
        reason: String,
    },

    /// The codec failed while encoding
    #[error("codec failed for {original_ref}: {reason}")]
    CodecFailed {
        /// Caller-supplied reference to the raw input
        original_ref: String,
        /// The reason encoding failed
        reason: String,
    },

    /// No codec binary is available for this kind (e.g., ffmpeg not installed)
    #[error("no codec available for {kind}")]
    CodecUnavailable {
        /// Media kind that has no codec
        kind: String,
    },

    /// Writing the compressed payload to the media directory failed
    #[error("failed to spool compressed media to {path}: {reason}")]
    SpoolFailed {
        /// Destination path
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// The batch was empty
    #[error("no media supplied")]
    EmptyBatch,
}

/// Publish service errors
///
/// The message is stored verbatim as the draft's `error_message`.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// Transport-level failure (DNS, connect, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// The service rejected the draft
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the service
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The media payload referenced by the draft could not be read
    #[error("media unavailable at {reference}: {reason}")]
    MediaUnavailable {
        /// Media reference stored on the draft
        reference: String,
        /// The reason reading failed
        reason: String,
    },

    /// Any other failure reported by the publish service
    #[error("{0}")]
    Other(String),
}

/// Persisted draft data could not be decoded
///
/// Only ever logged: a corrupted store is treated as empty at startup.
#[derive(Debug, Error)]
#[error("stored drafts under key {key} are unreadable: {reason}")]
pub struct StorageReadError {
    /// Store key that was read
    pub key: String,
    /// The reason decoding failed
    pub reason: String,
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_state",
///     "message": "draft error: cannot retry draft 6f1c... in state draft",
///     "details": { "draft_id": "6f1c..." }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "draft_not_found", "invalid_state")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,

            Error::Draft(DraftError::NotFound { .. }) => 404,
            Error::Draft(DraftError::InvalidState { .. }) => 409,
            Error::Draft(DraftError::ForeignMedia { .. }) => 400,

            Error::Compression(CompressionError::UnsupportedKind { .. }) => 415,
            Error::Compression(CompressionError::CodecUnavailable { .. }) => 501,
            Error::Compression(CompressionError::SpoolFailed { .. }) => 500,
            Error::Compression(_) => 422,

            Error::Publish(_) => 502,

            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Draft(e) => match e {
                DraftError::NotFound { .. } => "draft_not_found",
                DraftError::InvalidState { .. } => "invalid_state",
                DraftError::ForeignMedia { .. } => "foreign_media",
            },
            Error::Compression(e) => match e {
                CompressionError::UnsupportedKind { .. } => "unsupported_media",
                CompressionError::Unreadable { .. } => "unreadable_media",
                CompressionError::CodecFailed { .. } => "codec_failed",
                CompressionError::CodecUnavailable { .. } => "codec_unavailable",
                CompressionError::SpoolFailed { .. } => "spool_failed",
                CompressionError::EmptyBatch => "empty_batch",
            },
            Error::Publish(_) => "publish_error",
            Error::Io(_) => "io_error",
            Error::ShuttingDown => "shutting_down",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Draft(DraftError::NotFound { id }) => Some(serde_json::json!({
                "draft_id": id,
            })),
            Error::Draft(DraftError::InvalidState {
                id,
                operation,
                current_state,
            }) => Some(serde_json::json!({
                "draft_id": id,
                "operation": operation,
                "current_state": current_state,
            })),
            Error::Draft(DraftError::ForeignMedia { reference }) => Some(serde_json::json!({
                "reference": reference,
            })),
            Error::Compression(CompressionError::UnsupportedKind { original_ref, mime }) => {
                Some(serde_json::json!({
                    "original_ref": original_ref,
                    "mime": mime,
                }))
            }
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}
