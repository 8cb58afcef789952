//! REST API server module
//!
//! Exposes the draft queue, sync control, connectivity and the event stream
//! over HTTP so a UI process can drive an engine running elsewhere.

use crate::{Config, DraftSyncEngine, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Drafts
/// - `GET /drafts` - List all drafts in insertion order
/// - `POST /drafts` - Queue a draft (JSON body)
/// - `POST /drafts/media` - Compress an upload and queue a draft with it (multipart)
/// - `DELETE /drafts/uploaded` - Clear uploaded drafts
/// - `GET /drafts/:id` - Get single draft
/// - `PATCH /drafts/:id` - Edit a pending draft
/// - `DELETE /drafts/:id` - Remove a draft
/// - `POST /drafts/:id/retry` - Hand a failed draft back to the pending set
///
/// ## Sync
/// - `POST /sync` - Run a sync pass
/// - `GET /sync` - Sync state, draft counts and connectivity
/// - `GET /connectivity` - Current connectivity
/// - `PUT /connectivity` - Report connectivity
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /events` - Server-sent events stream
pub fn create_router(engine: Arc<DraftSyncEngine>, config: Arc<Config>) -> Router {
    let state = AppState::new(engine, config.clone());

    let router = Router::new()
        // Drafts
        .route("/drafts", get(routes::list_drafts))
        .route("/drafts", post(routes::add_draft))
        .route("/drafts/media", post(routes::add_draft_with_media))
        .route("/drafts/uploaded", delete(routes::clear_uploaded))
        .route("/drafts/:id", get(routes::get_draft))
        .route("/drafts/:id", patch(routes::update_draft))
        .route("/drafts/:id", delete(routes::delete_draft))
        .route("/drafts/:id/retry", post(routes::retry_draft))
        // Sync
        .route("/sync", post(routes::start_sync))
        .route("/sync", get(routes::sync_status))
        .route("/connectivity", get(routes::get_connectivity))
        .route("/connectivity", put(routes::set_connectivity))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream))
        .with_state(state);

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until the server stops or fails.
///
/// # Example
///
/// ```no_run
/// use draft_sync::{Config, DraftSyncEngine};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let engine = Arc::new(DraftSyncEngine::new((*config).clone()).await?);
///
/// draft_sync::api::start_api_server(engine, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(engine: Arc<DraftSyncEngine>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(engine, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
