use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::common::{map_service_error, success_response};
use crate::{
    auth::AuthUser, commands::schedule::reorder_schedule_command::ScheduleReorder,
    errors::ApiError, handlers::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleReorderResponse {
    pub moved: usize,
}

/// Production schedule columns with their remaining-time aggregate
#[utoipa::path(
    get,
    path = "/api/v1/schedule/columns",
    responses(
        (status = 200, description = "Columns in display order", body = [crate::services::schedule::ScheduleColumnView]),
        (status = 403, description = "Missing view_production", body = crate::errors::ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn list_columns(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let columns = state
        .services
        .schedule
        .columns(user.company_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(columns))
}

/// Persist a drop: the target column and its items top to bottom
#[utoipa::path(
    post,
    path = "/api/v1/schedule/reorder",
    request_body = ScheduleReorder,
    responses(
        (status = 200, description = "Items moved", body = ScheduleReorderResponse),
        (status = 403, description = "Item or column belongs to another company", body = crate::errors::ErrorResponse),
        (status = 422, description = "Duplicate items", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn reorder(
    State(state): State<AppState>,
    user: AuthUser,
    Json(reorder): Json<ScheduleReorder>,
) -> Result<impl IntoResponse, ApiError> {
    let moved = state
        .services
        .schedule
        .reorder(user.company_id, reorder)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ScheduleReorderResponse { moved }))
}

pub fn schedule_read_routes() -> Router<AppState> {
    Router::new().route("/schedule/columns", get(list_columns))
}

pub fn schedule_write_routes() -> Router<AppState> {
    Router::new().route("/schedule/reorder", post(reorder))
}
