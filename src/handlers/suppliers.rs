use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use uuid::Uuid;

use super::{
    common::{forbidden_step, step_failed, validate_input},
    paths,
};
use crate::{
    auth::AuthUser,
    commands::suppliers::SupplierForm,
    errors::ApiError,
    flash::{Flash, FlashCookies},
    handlers::AppState,
};

async fn save(
    state: AppState,
    user: AuthUser,
    flash: FlashCookies,
    id: Option<Uuid>,
    form: SupplierForm,
) -> Result<Response, ApiError> {
    validate_input(&form)?;
    let redirect = match state.services.suppliers.upsert(&user, id, form).await {
        Ok(upsert) => flash.redirect(
            paths::supplier(upsert.supplier.id),
            Flash::success(upsert.message()),
        ),
        Err(e) => {
            if let Some(forbidden) = forbidden_step(&e) {
                return Err(forbidden);
            }
            step_failed(&flash, paths::SUPPLIERS, &e)
        }
    };
    Ok(redirect.into_response())
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = SupplierForm,
    responses(
        (status = 303, description = "Redirect to the new supplier"),
        (status = 403, description = "Missing create_purchasing", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<SupplierForm>,
) -> Result<Response, ApiError> {
    save(state, user, flash, None, form).await
}

/// Update a supplier owned by the caller's company
#[utoipa::path(
    post,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = SupplierForm,
    responses(
        (status = 303, description = "Redirect to the supplier"),
        (status = 403, description = "Missing update_purchasing", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<SupplierForm>,
) -> Result<Response, ApiError> {
    save(state, user, flash, Some(id), form).await
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", post(create_supplier))
        .route("/suppliers/:id", post(update_supplier))
}
