//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`drafts`] - Draft queue management
//! - [`sync`] - Sync passes and connectivity
//! - [`system`] - Health, events, OpenAPI

use crate::types::{ConnectivityStatus, DraftId, DraftStats, SyncState};
use serde::{Deserialize, Serialize};

mod drafts;
mod sync;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use drafts::*;
pub use sync::*;
pub use system::*;

/// Response for POST /drafts and POST /drafts/media
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DraftCreatedResponse {
    /// Identifier of the queued draft
    pub id: DraftId,
}

/// Response for DELETE /drafts/uploaded
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ClearUploadedResponse {
    /// Number of uploaded drafts removed
    pub cleared: usize,
}

/// Response for GET /sync
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SyncStatusResponse {
    /// Current sync session
    pub sync: SyncState,
    /// Draft counts by status
    pub drafts: DraftStats,
    /// Current connectivity
    pub connectivity: ConnectivityStatus,
}
