//! Application state for the API server

use crate::{Config, DraftSyncEngine};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The engine every handler delegates to
    pub engine: Arc<DraftSyncEngine>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(engine: Arc<DraftSyncEngine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }
}
