use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser, commands::savedviews::SavedViewForm, errors::ApiError, handlers::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GroupQuery {
    /// Navigation group, e.g. `employee`
    pub group: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReorderViewsRequest {
    #[validate(length(min = 1, max = 64))]
    pub group_key: String,
    pub view_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewFlushResponse {
    pub flushed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteViewRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// The caller's views in one group, in display order
#[utoipa::path(
    get,
    path = "/api/v1/saved-views",
    params(GroupQuery),
    responses((status = 200, description = "Saved views", body = [Object])),
    tag = "saved-views"
)]
pub async fn list_views(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let views = state
        .services
        .saved_views
        .list(&user, &query.group)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(views))
}

#[utoipa::path(
    post,
    path = "/api/v1/saved-views",
    request_body = SavedViewForm,
    responses(
        (status = 201, description = "View appended to its group", body = Object),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "saved-views"
)]
pub async fn create_view(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<SavedViewForm>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&form)?;
    let view = state
        .services
        .saved_views
        .create(&user, form)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(view))
}

/// New positions come back at once; the write follows after the quiet period
#[utoipa::path(
    put,
    path = "/api/v1/saved-views/order",
    request_body = ReorderViewsRequest,
    responses(
        (status = 200, description = "Positions assigned", body = [crate::services::saved_views::SavedViewPosition]),
        (status = 422, description = "Not a permutation of the group", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "saved-views"
)]
pub async fn reorder_views(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ReorderViewsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&request)?;
    let positions = state
        .services
        .saved_views
        .reorder(&user, &request.group_key, request.view_ids)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(positions))
}

#[utoipa::path(
    post,
    path = "/api/v1/saved-views/order/flush",
    params(GroupQuery),
    responses((status = 200, description = "Pending order written", body = ViewFlushResponse)),
    tag = "saved-views"
)]
pub async fn flush_order(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let flushed = state
        .services
        .saved_views
        .flush(&user, &query.group)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ViewFlushResponse { flushed }))
}

/// Confirmation prompt shown before a delete
#[utoipa::path(
    get,
    path = "/api/v1/saved-views/{id}/delete",
    params(("id" = Uuid, Path, description = "Saved view id")),
    responses(
        (status = 200, description = "Prompt", body = crate::services::saved_views::DeletePrompt),
        (status = 404, description = "Not one of the caller's views", body = crate::errors::ErrorResponse)
    ),
    tag = "saved-views"
)]
pub async fn delete_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = state
        .services
        .saved_views
        .delete_prompt(&user, id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(prompt))
}

#[utoipa::path(
    delete,
    path = "/api/v1/saved-views/{id}",
    params(("id" = Uuid, Path, description = "Saved view id")),
    request_body = DeleteViewRequest,
    responses(
        (status = 200, description = "Deleted view", body = Object),
        (status = 422, description = "Deletion must be confirmed", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "saved-views"
)]
pub async fn delete_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(request): Json<DeleteViewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .services
        .saved_views
        .delete(&user, id, request.confirm)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(deleted))
}

/// People module navigation with saved views under their routes
#[utoipa::path(
    get,
    path = "/api/v1/navigation/people",
    responses((status = 200, description = "Navigation groups", body = [crate::services::saved_views::NavigationGroup])),
    tag = "saved-views"
)]
pub async fn people_navigation(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let groups = state
        .services
        .saved_views
        .people_navigation(&user)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(groups))
}

pub fn saved_view_routes() -> Router<AppState> {
    Router::new()
        .route("/saved-views", get(list_views).post(create_view))
        .route("/saved-views/order", put(reorder_views))
        .route("/saved-views/order/flush", post(flush_order))
        .route("/saved-views/:id/delete", get(delete_prompt))
        .route("/saved-views/:id", axum::routing::delete(delete_view))
}

pub fn people_navigation_routes() -> Router<AppState> {
    Router::new().route("/navigation/people", get(people_navigation))
}
