use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    common::{step_failed, success_response, validate_input},
    paths,
};
use crate::{
    auth::AuthUser,
    commands::purchaseorders::{
        PurchaseOrderDeliveryForm, PurchaseOrderDetailsForm, PurchaseOrderPaymentForm,
    },
    common::{request_locale, request_referrer},
    errors::{ApiError, FieldErrors},
    flash::{Flash, FlashCookies},
    handlers::AppState,
    services::{
        purchase_orders::PurchaseOrderDetails,
        release::{
            NotificationOutcome, ReleaseError, ReleaseForm, ReleaseRequest, NOT_AUTHORIZED,
            RELEASED,
        },
    },
};

/// Details page view model plus the one-shot status message
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseOrderPage {
    #[serde(flatten)]
    pub details: PurchaseOrderDetails,
    pub flash: Option<Flash>,
}

/// Load a purchase order with its payment, delivery, lines and notes
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order details", body = PurchaseOrderPage),
        (status = 303, description = "Load failed; redirected to the purchase order list"),
        (status = 403, description = "Missing view_purchasing", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
) -> Response {
    let pending = flash.take();
    match state.services.purchase_orders.load_details(id, &user).await {
        Ok(details) => success_response(PurchaseOrderPage {
            details,
            flash: pending,
        }),
        Err(e) => step_failed(&flash, paths::PURCHASE_ORDERS, &e).into_response(),
    }
}

/// Update the header fields of a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/details",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = PurchaseOrderDetailsForm,
    responses(
        (status = 303, description = "Redirect with a status message"),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<PurchaseOrderDetailsForm>,
) -> Result<Response, ApiError> {
    validate_input(&form)?;
    let location = paths::purchase_order(id);
    let redirect = match state
        .services
        .purchase_orders
        .update_details(id, &user, form)
        .await
    {
        Ok(_) => flash.redirect(location, Flash::success("Updated purchase order")),
        Err(e) => step_failed(&flash, location, &e),
    };
    Ok(redirect.into_response())
}

/// Update the delivery section; only Draft and To Review orders accept changes
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/delivery",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = PurchaseOrderDeliveryForm,
    responses(
        (status = 303, description = "Redirect with a status message"),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<PurchaseOrderDeliveryForm>,
) -> Result<Response, ApiError> {
    validate_input(&form)?;
    let location = paths::purchase_order(id);
    let redirect = match state
        .services
        .purchase_orders
        .update_delivery(id, &user, form)
        .await
    {
        Ok(_) => flash.redirect(location, Flash::success("Updated purchase order delivery")),
        Err(e) => step_failed(&flash, location, &e),
    };
    Ok(redirect.into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = PurchaseOrderPaymentForm,
    responses(
        (status = 303, description = "Redirect with a status message"),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<PurchaseOrderPaymentForm>,
) -> Result<Response, ApiError> {
    validate_input(&form)?;
    let location = paths::purchase_order(id);
    let redirect = match state
        .services
        .purchase_orders
        .update_payment(id, &user, form)
        .await
    {
        Ok(_) => flash.redirect(location, Flash::success("Updated purchase order payment")),
        Err(e) => step_failed(&flash, location, &e),
    };
    Ok(redirect.into_response())
}

/// Release a purchase order to its supplier
///
/// Renders and stores the PDF, moves the order to Released and optionally
/// queues the supplier email. Every outcome is a redirect carrying a flash.
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/release",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = ReleaseForm,
    responses(
        (status = 303, description = "Redirect with a status message"),
        (status = 422, description = "Invalid notification or contact", body = crate::errors::ValidationErrorResponse),
        (status = 403, description = "Requires create_purchasing and the employee role", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn release_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    headers: HeaderMap,
    flash: FlashCookies,
    Json(form): Json<ReleaseForm>,
) -> Result<Response, ApiError> {
    let options = form.parse().map_err(ApiError::Validation)?;
    let request = ReleaseRequest {
        purchase_order_id: id,
        options,
        locale: request_locale(&headers),
    };
    let order_page = paths::purchase_order(id);

    let redirect = match state.services.release.release(&user, request).await {
        Ok(outcome) => match outcome.notification {
            NotificationOutcome::Failed(e) => step_failed(&flash, order_page, &e),
            NotificationOutcome::Enqueued { task_id } => {
                info!(%id, %task_id, "release email queued");
                let back = request_referrer(&headers).unwrap_or(order_page);
                flash.redirect(back, Flash::success(RELEASED))
            }
            NotificationOutcome::NotRequested => {
                let back = request_referrer(&headers).unwrap_or(order_page);
                flash.redirect(back, Flash::success(RELEASED))
            }
        },
        Err(ReleaseError::NotAuthorized) => {
            flash.redirect(paths::PURCHASE_ORDERS, Flash::error(NOT_AUTHORIZED))
        }
        Err(ReleaseError::NotReleasable(message)) => {
            flash.redirect(order_page, Flash::error(message))
        }
        Err(ReleaseError::Step {
            step,
            error,
            released,
        }) => {
            if released {
                warn!(%id, ?step, "released without a stored document");
            }
            step_failed(&flash, order_page, &error)
        }
    };
    Ok(redirect.into_response())
}

pub fn purchase_order_read_routes() -> Router<AppState> {
    Router::new().route("/purchase-orders/:id", get(get_purchase_order))
}

pub fn purchase_order_write_routes() -> Router<AppState> {
    Router::new()
        .route("/purchase-orders/:id/details", post(update_details))
        .route("/purchase-orders/:id/delivery", post(update_delivery))
        .route("/purchase-orders/:id/payment", post(update_payment))
}

pub fn purchase_order_release_routes() -> Router<AppState> {
    Router::new().route("/purchase-orders/:id/release", post(release_purchase_order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_notification_rejects_before_release() {
        let form = ReleaseForm {
            notification: Some("Carrier pigeon".into()),
            supplier_contact: None,
        };
        let errors: FieldErrors = form.parse().unwrap_err();
        assert_eq!(
            errors.get("notification"),
            Some(&["Invalid notification type".to_string()][..])
        );
    }
}
