//! Sync and connectivity handlers.

use super::SyncStatusResponse;
use crate::api::AppState;
use crate::types::{ConnectivityStatus, SyncOutcome};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// POST /sync - Run a sync pass
///
/// Responds once the pass completes. A concurrent request gets
/// `already_running` immediately.
#[utoipa::path(
    post,
    path = "/api/v1/sync",
    tag = "sync",
    responses(
        (status = 200, description = "Pass finished or another pass was already running", body = SyncOutcome)
    )
)]
pub async fn start_sync(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.engine.sync_drafts().await))
}

/// GET /sync - Sync state, draft counts and connectivity
#[utoipa::path(
    get,
    path = "/api/v1/sync",
    tag = "sync",
    responses(
        (status = 200, description = "Current sync status", body = SyncStatusResponse)
    )
)]
pub async fn sync_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(SyncStatusResponse {
        sync: state.engine.sync_state().await,
        drafts: state.engine.stats().await,
        connectivity: state.engine.connectivity().status(),
    })
}

/// GET /connectivity - Current connectivity
#[utoipa::path(
    get,
    path = "/api/v1/connectivity",
    tag = "sync",
    responses(
        (status = 200, description = "Current connectivity", body = ConnectivityStatus)
    )
)]
pub async fn get_connectivity(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.connectivity().status())
}

/// PUT /connectivity - Report connectivity
///
/// Going from offline to online triggers a sync pass when auto-sync is on.
#[utoipa::path(
    put,
    path = "/api/v1/connectivity",
    tag = "sync",
    request_body = ConnectivityStatus,
    responses(
        (status = 200, description = "Status applied", body = ConnectivityStatus)
    )
)]
pub async fn set_connectivity(
    State(state): State<AppState>,
    Json(status): Json<ConnectivityStatus>,
) -> impl IntoResponse {
    state.engine.set_connectivity(status);
    Json(state.engine.connectivity().status())
}
