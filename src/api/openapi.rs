//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the draft-sync REST API
///
/// Served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "draft-sync REST API",
        version = "0.1.0",
        description = "Offline draft queue: compose drafts, track their upload state, and trigger sync passes",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790/api/v1", description = "Local development server")
    ),
    paths(
        // Drafts
        crate::api::routes::list_drafts,
        crate::api::routes::get_draft,
        crate::api::routes::add_draft,
        crate::api::routes::add_draft_with_media,
        crate::api::routes::update_draft,
        crate::api::routes::delete_draft,
        crate::api::routes::retry_draft,
        crate::api::routes::clear_uploaded,

        // Sync
        crate::api::routes::start_sync,
        crate::api::routes::sync_status,
        crate::api::routes::get_connectivity,
        crate::api::routes::set_connectivity,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::DraftId,
        crate::types::DraftStatus,
        crate::types::MediaKind,
        crate::types::DraftMedia,
        crate::types::DraftRecord,
        crate::types::NewDraft,
        crate::types::DraftUpdate,
        crate::types::DraftStats,
        crate::types::SyncState,
        crate::types::SyncReport,
        crate::types::SyncOutcome,
        crate::types::ConnectionType,
        crate::types::ConnectivityStatus,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::PersistenceConfig,
        crate::config::CompressionConfig,
        crate::config::PublishConfig,
        crate::config::ConnectivityConfig,
        crate::config::ApiConfig,

        // API request/response types from routes
        crate::api::routes::DraftCreatedResponse,
        crate::api::routes::ClearUploadedResponse,
        crate::api::routes::SyncStatusResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "drafts", description = "Draft queue - Compose, edit, remove and retry drafts"),
        (name = "sync", description = "Sync - Run passes, inspect progress, report connectivity"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
