use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, forbidden_step, map_service_error, success_response, validate_input,
};
use crate::{
    auth::AuthUser,
    errors::{ApiError, FieldErrors},
    handlers::AppState,
    services::notes::{NoteImage, NoteScope, NoteTable},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NoteEditRequest {
    /// Rich text document as produced by the editor
    #[schema(value_type = Object)]
    pub content: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteEditAccepted {
    pub generation: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteFlushResponse {
    pub flushed: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NoteImageRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub content_type: String,
    /// Base64 encoded file content
    #[validate(length(min = 1))]
    pub content: String,
}

impl NoteImageRequest {
    fn into_image(self) -> Result<NoteImage, ApiError> {
        let bytes = STANDARD.decode(self.content.as_bytes()).map_err(|_| {
            ApiError::Validation(FieldErrors::single("content", "Invalid image encoding"))
        })?;
        Ok(NoteImage {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: Bytes::from(bytes),
        })
    }
}

/// Notes for one record, as editor JSON or read-only HTML
#[utoipa::path(
    get,
    path = "/api/v1/notes/{table}/{id}",
    params(
        ("table" = NoteTable, Path, description = "Record table"),
        ("id" = Uuid, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Visible note tabs", body = crate::services::notes::NotesView),
        (status = 404, description = "Record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn get_notes(
    State(state): State<AppState>,
    Path((table, id)): Path<(NoteTable, Uuid)>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .notes
        .get_notes(&user, table, id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Queue an edit; the row is written once edits stop for the quiet period
#[utoipa::path(
    put,
    path = "/api/v1/notes/{table}/{id}/{scope}",
    params(
        ("table" = NoteTable, Path, description = "Record table"),
        ("id" = Uuid, Path, description = "Record id"),
        ("scope" = NoteScope, Path, description = "internal or external")
    ),
    request_body = NoteEditRequest,
    responses(
        (status = 202, description = "Edit accepted", body = NoteEditAccepted),
        (status = 403, description = "Scope not editable", body = crate::errors::ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn update_note(
    State(state): State<AppState>,
    Path((table, id, scope)): Path<(NoteTable, Uuid, NoteScope)>,
    user: AuthUser,
    Json(request): Json<NoteEditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let generation = state
        .services
        .notes
        .push_edit(&user, table, id, scope, request.content)
        .await
        .map_err(map_service_error)?;
    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(NoteEditAccepted { generation }),
    ))
}

/// Write any pending edits for a record immediately
#[utoipa::path(
    post,
    path = "/api/v1/notes/{table}/{id}/flush",
    params(
        ("table" = NoteTable, Path, description = "Record table"),
        ("id" = Uuid, Path, description = "Record id")
    ),
    responses((status = 200, description = "Pending edits written", body = NoteFlushResponse)),
    tag = "notes"
)]
pub async fn flush_notes(
    State(state): State<AppState>,
    Path((table, id)): Path<(NoteTable, Uuid)>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let flushed = state
        .services
        .notes
        .flush(&user, table, id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(NoteFlushResponse { flushed }))
}

#[utoipa::path(
    post,
    path = "/api/v1/notes/{table}/{id}/images",
    params(
        ("table" = NoteTable, Path, description = "Record table"),
        ("id" = Uuid, Path, description = "Record id")
    ),
    request_body = NoteImageRequest,
    responses(
        (status = 201, description = "Image stored", body = crate::services::notes::NoteImageLink),
        (status = 422, description = "Not an image", body = crate::errors::ValidationErrorResponse),
        (status = 500, description = "Failed to upload image", body = crate::errors::ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn upload_note_image(
    State(state): State<AppState>,
    Path((table, id)): Path<(NoteTable, Uuid)>,
    user: AuthUser,
    Json(request): Json<NoteImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&request)?;
    let image = request.into_image()?;
    let link = state
        .services
        .notes
        .upload_image(&user, table, id, image)
        .await
        .map_err(|e| forbidden_step(&e).unwrap_or_else(|| map_service_error(e.source)))?;
    Ok(created_response(link))
}

pub fn notes_routes() -> Router<AppState> {
    Router::new()
        .route("/notes/:table/:id", get(get_notes))
        .route("/notes/:table/:id/flush", post(flush_notes))
        .route("/notes/:table/:id/images", post(upload_note_image))
        .route("/notes/:table/:id/:scope", put(update_note))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn image_payload_decodes_base64() {
        let request = NoteImageRequest {
            file_name: "sketch.PNG".into(),
            content_type: "image/png".into(),
            content: STANDARD.encode([0x89, b'P', b'N', b'G']),
        };
        let image = request.into_image().unwrap();
        assert_eq!(&image.bytes[..], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn garbage_content_is_a_field_error() {
        let request = NoteImageRequest {
            file_name: "a.png".into(),
            content_type: "image/png".into(),
            content: "not*base64!".into(),
        };
        assert_matches!(request.into_image(), Err(ApiError::Validation(errors)) => {
            assert!(errors.get("content").is_some());
        });
    }
}
