//! Draft queue handlers.

use super::{ClearUploadedResponse, DraftCreatedResponse};
use crate::api::AppState;
use crate::compression::RawMedia;
use crate::error::{ApiError, DraftError, Error};
use crate::types::{DraftId, DraftRecord, DraftUpdate, NewDraft};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /drafts - List all drafts
#[utoipa::path(
    get,
    path = "/api/v1/drafts",
    tag = "drafts",
    responses(
        (status = 200, description = "All drafts in insertion order", body = Vec<DraftRecord>)
    )
)]
pub async fn list_drafts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.drafts().await)
}

/// GET /drafts/:id - Get single draft
#[utoipa::path(
    get,
    path = "/api/v1/drafts/{id}",
    tag = "drafts",
    params(
        ("id" = String, Path, description = "Draft ID")
    ),
    responses(
        (status = 200, description = "Draft", body = DraftRecord),
        (status = 404, description = "Draft not found", body = crate::error::ApiError)
    )
)]
pub async fn get_draft(State(state): State<AppState>, Path(id): Path<DraftId>) -> Response {
    match state.engine.draft(id).await {
        Some(draft) => (StatusCode::OK, Json(draft)).into_response(),
        None => Error::Draft(DraftError::NotFound { id }).into_response(),
    }
}

/// POST /drafts - Queue a draft
#[utoipa::path(
    post,
    path = "/api/v1/drafts",
    tag = "drafts",
    request_body = NewDraft,
    responses(
        (status = 201, description = "Draft queued", body = DraftCreatedResponse),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn add_draft(State(state): State<AppState>, Json(draft): Json<NewDraft>) -> Response {
    match state.engine.add_draft(draft).await {
        Ok(id) => (StatusCode::CREATED, Json(DraftCreatedResponse { id })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /drafts/media - Compress an upload and queue a draft with it
///
/// Multipart fields: `file` (required, its content type selects the codec)
/// and `draft` (optional JSON [`NewDraft`]).
#[utoipa::path(
    post,
    path = "/api/v1/drafts/media",
    tag = "drafts",
    request_body(content = Vec<u8>, description = "Media upload plus optional draft JSON (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Draft queued with compressed media", body = DraftCreatedResponse),
        (status = 400, description = "Missing or malformed field", body = crate::error::ApiError),
        (status = 415, description = "Unsupported media type", body = crate::error::ApiError),
        (status = 422, description = "Media could not be compressed", body = crate::error::ApiError)
    )
)]
pub async fn add_draft_with_media(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut media: Option<RawMedia> = None;
    let mut draft = NewDraft::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return ApiError::validation(format!("Malformed multipart body: {}", e))
                    .into_response();
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let original_ref = field.file_name().unwrap_or("upload").to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => media = Some(RawMedia::new(original_ref, mime, bytes.to_vec())),
                    Err(e) => {
                        return ApiError::validation(format!("Failed to read file: {}", e))
                            .into_response();
                    }
                }
            }
            "draft" => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(e) => {
                        return ApiError::validation(format!("Failed to read draft: {}", e))
                            .into_response();
                    }
                };
                match serde_json::from_str(&text) {
                    Ok(parsed) => draft = parsed,
                    Err(e) => {
                        return ApiError::validation(format!("Invalid draft JSON: {}", e))
                            .into_response();
                    }
                }
            }
            _ => {}
        }
    }

    let Some(media) = media else {
        return ApiError::validation("No media provided in 'file' field").into_response();
    };

    match state
        .engine
        .add_draft_with_media(draft, media, |_| {})
        .await
    {
        Ok(id) => (StatusCode::CREATED, Json(DraftCreatedResponse { id })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// PATCH /drafts/:id - Edit a pending draft
#[utoipa::path(
    patch,
    path = "/api/v1/drafts/{id}",
    tag = "drafts",
    params(
        ("id" = String, Path, description = "Draft ID")
    ),
    request_body = DraftUpdate,
    responses(
        (status = 200, description = "Updated draft", body = DraftRecord),
        (status = 404, description = "Draft not found", body = crate::error::ApiError),
        (status = 409, description = "Draft is uploading or uploaded", body = crate::error::ApiError)
    )
)]
pub async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
    Json(update): Json<DraftUpdate>,
) -> Response {
    match state.engine.update_draft(id, update).await {
        Ok(draft) => (StatusCode::OK, Json(draft)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /drafts/:id - Remove a draft
#[utoipa::path(
    delete,
    path = "/api/v1/drafts/{id}",
    tag = "drafts",
    params(
        ("id" = String, Path, description = "Draft ID")
    ),
    responses(
        (status = 204, description = "Draft removed"),
        (status = 404, description = "Draft not found", body = crate::error::ApiError),
        (status = 409, description = "Draft is uploading", body = crate::error::ApiError)
    )
)]
pub async fn delete_draft(State(state): State<AppState>, Path(id): Path<DraftId>) -> Response {
    match state.engine.remove_draft(id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /drafts/:id/retry - Hand a failed draft back to the pending set
#[utoipa::path(
    post,
    path = "/api/v1/drafts/{id}/retry",
    tag = "drafts",
    params(
        ("id" = String, Path, description = "Draft ID")
    ),
    responses(
        (status = 204, description = "Draft will be attempted on the next sync pass"),
        (status = 404, description = "Draft not found", body = crate::error::ApiError),
        (status = 409, description = "Draft is not failed", body = crate::error::ApiError)
    )
)]
pub async fn retry_draft(State(state): State<AppState>, Path(id): Path<DraftId>) -> Response {
    match state.engine.retry_draft(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /drafts/uploaded - Clear uploaded drafts
#[utoipa::path(
    delete,
    path = "/api/v1/drafts/uploaded",
    tag = "drafts",
    responses(
        (status = 200, description = "Uploaded drafts removed", body = ClearUploadedResponse)
    )
)]
pub async fn clear_uploaded(State(state): State<AppState>) -> Response {
    match state.engine.clear_uploaded_drafts().await {
        Ok(cleared) => (StatusCode::OK, Json(ClearUploadedResponse { cleared })).into_response(),
        Err(e) => e.into_response(),
    }
}
