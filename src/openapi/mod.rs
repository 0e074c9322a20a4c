use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ERP API",
        version = "1.0.0",
        description = r#"
# ERP record workflows

Purchasing, items, sales, production scheduling and people administration.

## Authentication

Every `/api/v1` endpoint requires a bearer JWT. The token's permission claims
(`view_purchasing`, `update_production`, ...) gate each route; a missing
capability is answered with `403` before any work is done.

## Form submissions

Mutating purchasing endpoints answer with `303 See Other` and a signed
`__flash` cookie carrying the outcome message. Invalid forms return `422`
with per-field messages and perform no mutation.
"#
    ),
    tags(
        (name = "purchase-orders", description = "Purchase order details and release"),
        (name = "notes", description = "Internal and external rich-text notes"),
        (name = "schedule", description = "Production Kanban"),
        (name = "saved-views", description = "Saved views and navigation"),
        (name = "suppliers", description = "Supplier records"),
        (name = "items", description = "Item posting groups and consumable costing"),
        (name = "sales", description = "Quote make methods and sales RFQ lines"),
        (name = "users", description = "User administration jobs"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::update_details,
        crate::handlers::purchase_orders::update_delivery,
        crate::handlers::purchase_orders::update_payment,
        crate::handlers::purchase_orders::release_purchase_order,

        crate::handlers::notes::get_notes,
        crate::handlers::notes::update_note,
        crate::handlers::notes::flush_notes,
        crate::handlers::notes::upload_note_image,

        crate::handlers::schedule::list_columns,
        crate::handlers::schedule::reorder,

        crate::handlers::saved_views::list_views,
        crate::handlers::saved_views::create_view,
        crate::handlers::saved_views::reorder_views,
        crate::handlers::saved_views::flush_order,
        crate::handlers::saved_views::delete_prompt,
        crate::handlers::saved_views::delete_view,
        crate::handlers::saved_views::people_navigation,

        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::update_supplier,

        crate::handlers::items::get_item_posting_group,
        crate::handlers::items::update_item_posting_group,
        crate::handlers::items::get_consumable_costing,
        crate::handlers::items::update_consumable_costing,

        crate::handlers::sales::get_quote_make_method,
        crate::handlers::sales::create_sales_rfq_line,

        crate::handlers::users::deactivate_user,
        crate::handlers::users::resend_invite,

        crate::handlers::health::health_check,
        crate::handlers::health::liveness_check,
    ),
    components(
        schemas(
            crate::flash::Flash,
            crate::flash::FlashKind,
            crate::services::release::NotificationMode,
            crate::services::notes::NoteTable,
            crate::services::notes::NoteScope,
            crate::models::CostingMethod,
            crate::services::schedule::ColumnIndicator,
            crate::errors::ErrorResponse,
            crate::errors::ValidationErrorResponse,
            crate::errors::FieldErrors
        )
    ),
    modifiers(&BearerAuth),
    security(("bearer_auth" = []))
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_workflow_routes() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("/api/v1/purchase-orders/{id}/release"));
        assert!(json.contains("/api/v1/notes/{table}/{id}/{scope}"));
        assert!(json.contains("/api/v1/saved-views/order"));
        assert!(json.contains("/api/v1/items/groups/{id}"));
        assert!(json.contains("/api/v1/sales-rfqs/{id}/lines"));
        assert!(json.contains("bearer_auth"));
    }
}
