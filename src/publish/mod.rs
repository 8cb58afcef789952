//! Publish service collaborator
//!
//! The sync coordinator hands each pending draft to a [`PublishService`]
//! once per attempt. Failures are opaque to the engine: the error's message
//! is stored on the draft verbatim and the draft stays eligible for the next
//! pass. Implementations should tolerate being called again for a draft that
//! may have partially succeeded server-side.

mod http;

pub use http::HttpPublisher;

use crate::error::PublishError;
use crate::types::DraftRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement returned by a successful publish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PublishReceipt {
    /// Identifier the remote service assigned to the published content
    pub remote_id: Option<String>,
}

impl PublishReceipt {
    /// Receipt carrying a remote identifier
    pub fn with_remote_id(remote_id: impl Into<String>) -> Self {
        Self {
            remote_id: Some(remote_id.into()),
        }
    }
}

/// Trait for publishing a draft to the remote service
#[async_trait]
pub trait PublishService: Send + Sync {
    /// Publish `draft` (content, attachments and compressed media reference)
    ///
    /// # Errors
    ///
    /// Any [`PublishError`]; the sync pass records it on the draft.
    async fn publish(&self, draft: &DraftRecord) -> Result<PublishReceipt, PublishError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Publisher used when no endpoint is configured
///
/// Every attempt fails, leaving drafts queued as `failed` with an
/// explanatory message until a real publisher is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredPublisher;

#[async_trait]
impl PublishService for UnconfiguredPublisher {
    async fn publish(&self, _draft: &DraftRecord) -> Result<PublishReceipt, PublishError> {
        Err(PublishError::Other(
            "no publish endpoint configured".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}
