use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use super::{
    common::{step_failed, success_response, validate_input},
    paths,
};
use crate::{
    auth::AuthUser,
    commands::sales::SalesRfqLineForm,
    errors::ApiError,
    flash::FlashCookies,
    handlers::AppState,
    services::sales::QuoteMakeMethod,
};

/// Load the bill of material and bill of process of a quote line's make method
#[utoipa::path(
    get,
    path = "/api/v1/quotes/{quote_id}/lines/{line_id}/methods/{method_id}",
    params(
        ("quote_id" = Uuid, Path, description = "Quote id"),
        ("line_id" = Uuid, Path, description = "Quote line id"),
        ("method_id" = Uuid, Path, description = "Quote make method id")
    ),
    responses(
        (status = 200, description = "Materials and operations", body = QuoteMakeMethod),
        (status = 303, description = "A query failed; redirected to the quote line"),
        (status = 403, description = "Missing view_sales", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn get_quote_make_method(
    State(state): State<AppState>,
    Path((quote_id, line_id, method_id)): Path<(Uuid, Uuid, Uuid)>,
    user: AuthUser,
    flash: FlashCookies,
) -> Response {
    match state.services.sales.load_make_method(method_id, &user).await {
        Ok(method) => success_response(method),
        Err(e) => step_failed(&flash, paths::quote_line(quote_id, line_id), &e).into_response(),
    }
}

/// Add a line to a sales RFQ and open it
#[utoipa::path(
    post,
    path = "/api/v1/sales-rfqs/{id}/lines",
    params(("id" = Uuid, Path, description = "Sales RFQ id")),
    request_body = SalesRfqLineForm,
    responses(
        (status = 303, description = "Redirect to the new line, or back to the RFQ with an error flash"),
        (status = 403, description = "Missing create_sales", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid form", body = crate::errors::ValidationErrorResponse)
    ),
    tag = "sales"
)]
pub async fn create_sales_rfq_line(
    State(state): State<AppState>,
    Path(rfq_id): Path<Uuid>,
    user: AuthUser,
    flash: FlashCookies,
    Json(form): Json<SalesRfqLineForm>,
) -> Result<Response, ApiError> {
    validate_input(&form)?;
    let response = match state.services.sales.insert_rfq_line(rfq_id, &user, form).await {
        Ok(line) => Redirect::to(&paths::sales_rfq_line(rfq_id, line.id)).into_response(),
        Err(e) => step_failed(&flash, paths::sales_rfq(rfq_id), &e).into_response(),
    };
    Ok(response)
}

pub fn quote_read_routes() -> Router<AppState> {
    Router::new().route(
        "/quotes/:quote_id/lines/:line_id/methods/:method_id",
        get(get_quote_make_method),
    )
}

pub fn sales_rfq_create_routes() -> Router<AppState> {
    Router::new().route("/sales-rfqs/:id/lines", post(create_sales_rfq_line))
}
