use axum::{
    extract::{Json, Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    common::{step_failed, step_flashed, success_response, validate_input},
    paths,
};
use crate::{
    auth::AuthUser,
    commands::items::{ItemCostForm, ItemPostingGroupForm},
    errors::ApiError,
    flash::{Flash, FlashCookies},
    handlers::AppState,
    models::item_posting_group,
    services::items::{ConsumableCosting, UPDATED_COSTING, UPDATED_GROUP},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemPostingGroupPage {
    #[schema(value_type = Option<Object>)]
    pub item_posting_group: Option<item_posting_group::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsumableCostingPage {
    #[serde(flatten)]
    pub costing: ConsumableCosting,
    pub flash: Option<Flash>,
}

/// Load an item posting group for editing; unknown ids give an empty form
#[utoipa::path(
    get,
    path = "/api/v1/items/groups/{id}",
    params(("id" = Uuid, Path, description = "Item posting group id")),
    responses(
        (status = 200, description = "Posting group or null", body = ItemPostingGroupPage),
        (status = 403, description = "Missing view_parts or not an employee", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item_posting_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Response {
    let item_posting_group = state.services.items.load_posting_group(id, &user).await;
    success_response(ItemPostingGroupPage { item_posting_group })
}

/// Update an item posting group
///
/// Success returns to the group list with the submitted query string; a
/// failed update stays on the form with an error flash.
#[utoipa::path(
    post,
    path = "/api/v1/items/groups/{id}",
    params(("id" = Uuid, Path, description = "Item posting group id")),
    request_body = ItemPostingGroupForm,
    responses(
        (status = 303, description = "Updated; redirect to the group list"),
        (status = 200, description = "Update failed; error flash set"),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "items"
)]
pub async fn update_item_posting_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    RawQuery(query): RawQuery,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<ItemPostingGroupForm>,
) -> Result<Response, ApiError> {
    validate_input(&form)?;
    match state
        .services
        .items
        .update_posting_group(id, &user, form)
        .await
    {
        Ok(_) => Ok(flash
            .redirect(
                paths::item_posting_groups(query.as_deref()),
                Flash::success(UPDATED_GROUP),
            )
            .into_response()),
        Err(e) => {
            step_flashed(&flash, &e);
            Ok((StatusCode::OK, Json(json!({}))).into_response())
        }
    }
}

/// Load a consumable's cost and cost history
#[utoipa::path(
    get,
    path = "/api/v1/consumables/{id}/costing",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Costing and history", body = ConsumableCostingPage),
        (status = 303, description = "Load failed; redirected to the item list"),
        (status = 403, description = "Missing view_parts", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_consumable_costing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
) -> Response {
    let pending = flash.take();
    match state.services.items.load_costing(id, &user).await {
        Ok(costing) => success_response(ConsumableCostingPage {
            costing,
            flash: pending,
        }),
        Err(e) => step_failed(&flash, paths::ITEMS, &e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/consumables/{id}/costing",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = ItemCostForm,
    responses(
        (status = 303, description = "Redirect with a status message"),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "items"
)]
pub async fn update_consumable_costing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<ItemCostForm>,
) -> Result<Response, ApiError> {
    validate_input(&form)?;
    let redirect = match state.services.items.update_costing(id, &user, form).await {
        Ok(_) => flash.redirect(paths::consumable_costing(id), Flash::success(UPDATED_COSTING)),
        Err(e) => step_failed(&flash, paths::consumable(id), &e),
    };
    Ok(redirect.into_response())
}

pub fn item_posting_group_read_routes() -> Router<AppState> {
    Router::new().route("/items/groups/:id", get(get_item_posting_group))
}

pub fn item_read_routes() -> Router<AppState> {
    Router::new().route("/consumables/:id/costing", get(get_consumable_costing))
}

pub fn item_write_routes() -> Router<AppState> {
    Router::new()
        .route("/items/groups/:id", post(update_item_posting_group))
        .route("/consumables/:id/costing", post(update_consumable_costing))
}
