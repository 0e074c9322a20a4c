use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::map_service_error;
use crate::{
    auth::AuthUser,
    common::{client_ip, client_location},
    errors::ApiError,
    handlers::AppState,
    tasks::UserAdminPayload,
};

/// The job was accepted; the worker reports the outcome
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskAccepted {
    pub task_id: Uuid,
}

async fn enqueue(state: &AppState, payload: UserAdminPayload) -> Result<impl IntoResponse, ApiError> {
    let task_id = state
        .services
        .tasks
        .user_admin(&payload)
        .await
        .map_err(map_service_error)?;
    Ok((StatusCode::ACCEPTED, Json(TaskAccepted { task_id })))
}

/// Queue deactivation of a user in the caller's company
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/deactivate",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 202, description = "Deactivation queued", body = TaskAccepted),
        (status = 403, description = "Missing delete_users", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    info!(user_id = %id, by = %user.user_id, "queueing user deactivation");
    enqueue(
        &state,
        UserAdminPayload::Deactivate {
            id,
            company_id: user.company_id,
        },
    )
    .await
}

/// Queue a fresh copy of a pending invite
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/resend-invite",
    params(("id" = Uuid, Path, description = "Invited user id")),
    responses(
        (status = 202, description = "Invite resend queued", body = TaskAccepted),
        (status = 403, description = "Missing create_users", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn resend_invite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    enqueue(
        &state,
        UserAdminPayload::Resend {
            id,
            location: client_location(&headers),
            ip: client_ip(&headers),
            company_id: user.company_id,
        },
    )
    .await
}

pub fn user_deactivate_routes() -> Router<AppState> {
    Router::new().route("/users/:id/deactivate", post(deactivate_user))
}

pub fn user_invite_routes() -> Router<AppState> {
    Router::new().route("/users/:id/resend-invite", post(resend_invite))
}
