//! Debounced rich-text notes on purchase orders.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, json_body, TestApp};
use erp_api::auth::{Action, AuthUser, Module, PermissionMatrix, Role};
use serde_json::{json, Value};

fn paragraph(text: &str) -> Value {
    json!({
        "type": "doc",
        "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": text }] }
        ]
    })
}

#[tokio::test]
async fn rapid_edits_coalesce_into_one_write() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let base = format!("/api/v1/notes/purchaseOrder/{}", fixture.purchase_order_id);

    let mut last_generation = 0;
    for text in ["Call", "Call supplier", "Call supplier before Friday"] {
        let response = app
            .request(
                Method::PUT,
                &format!("{}/internal", base),
                Some(json!({ "content": paragraph(text) })),
                Some(&token),
            )
            .await;
        assert_status(&response, StatusCode::ACCEPTED);
        let generation = json_body(response).await["generation"]
            .as_u64()
            .expect("generation");
        assert!(generation > last_generation);
        last_generation = generation;
    }

    // still inside the quiet period
    let order = app.purchase_order(fixture.purchase_order_id).await;
    assert!(order.internal_notes.is_none());

    let response = app
        .request(Method::POST, &format!("{}/flush", base), None, Some(&token))
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(json_body(response).await["flushed"], 1);

    let order = app.purchase_order(fixture.purchase_order_id).await;
    assert_eq!(
        order.internal_notes,
        Some(paragraph("Call supplier before Friday"))
    );
    assert_eq!(order.updated_by, Some(fixture.user_id));

    // nothing left to write
    let response = app
        .request(Method::POST, &format!("{}/flush", base), None, Some(&token))
        .await;
    assert_eq!(json_body(response).await["flushed"], 0);
}

#[tokio::test]
async fn editors_receive_json_and_viewers_receive_html() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let editor = app.token_for(&app.employee(&fixture));
    let uri = format!("/api/v1/notes/purchaseOrder/{}", fixture.purchase_order_id);

    app.request(
        Method::PUT,
        &format!("{}/external", uri),
        Some(json!({ "content": paragraph("Ship <fast>") })),
        Some(&editor),
    )
    .await;
    app.request(Method::POST, &format!("{}/flush", uri), None, Some(&editor))
        .await;

    let response = app.request(Method::GET, &uri, None, Some(&editor)).await;
    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["editable"], true);
    assert_eq!(body["tabs"], json!(["internal", "external"]));
    assert_eq!(body["default_tab"], "internal");
    assert_eq!(body["external"]["format"], "json");

    let viewer = AuthUser::new(
        fixture.user_id,
        fixture.company_id,
        Role::Employee,
        PermissionMatrix::empty().with(Action::View, Module::Purchasing),
    );
    let response = app
        .request(Method::GET, &uri, None, Some(&app.token_for(&viewer)))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["editable"], false);
    assert_eq!(body["external"]["format"], "html");
    assert_eq!(body["external"]["content"], "<p>Ship &lt;fast&gt;</p>");
}

#[tokio::test]
async fn viewers_cannot_queue_edits() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let viewer = AuthUser::new(
        fixture.user_id,
        fixture.company_id,
        Role::Employee,
        PermissionMatrix::empty().with(Action::View, Module::Purchasing),
    );

    let response = app
        .request(
            Method::PUT,
            &format!(
                "/api/v1/notes/purchaseOrder/{}/internal",
                fixture.purchase_order_id
            ),
            Some(json!({ "content": paragraph("nope") })),
            Some(&app.token_for(&viewer)),
        )
        .await;

    assert_status(&response, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn image_upload_returns_a_preview_link() {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));

    let response = app
        .request(
            Method::POST,
            &format!(
                "/api/v1/notes/purchaseOrder/{}/images",
                fixture.purchase_order_id
            ),
            Some(json!({
                "file_name": "diagram.jpg",
                "content_type": "image/jpeg",
                "content": STANDARD.encode([0xFFu8, 0xD8, 0xFF, 0xE0]),
            })),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::CREATED);
    let body = json_body(response).await;
    let path = body["path"].as_str().expect("path");
    assert!(path.starts_with(&fixture.company_id.to_string()));
    assert!(path.ends_with(".jpg"));
    assert_eq!(app.storage.len(), 1);
}

#[tokio::test]
async fn invoice_lines_take_internal_notes_only() {
    use erp_api::models::{purchase_invoice, purchase_invoice_line};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    use uuid::Uuid;

    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let invoice_id = Uuid::new_v4();
    let line_id = Uuid::new_v4();

    purchase_invoice::ActiveModel {
        id: Set(invoice_id),
        invoice_id: Set("PI000007".to_string()),
        company_id: Set(fixture.company_id),
        supplier_id: Set(fixture.supplier_id),
        supplier_interaction_id: Set(None),
        internal_notes: Set(None),
        external_notes: Set(None),
        updated_by: Set(None),
        updated_at: Set(None),
    }
    .insert(app.db())
    .await
    .expect("invoice");
    purchase_invoice_line::ActiveModel {
        id: Set(line_id),
        invoice_id: Set(invoice_id),
        company_id: Set(fixture.company_id),
        description: Set("M8 hex bolts".to_string()),
        quantity: Set(Decimal::new(500, 0)),
        unit_price: Set(Decimal::new(12, 2)),
        internal_notes: Set(None),
        external_notes: Set(None),
        updated_by: Set(None),
        updated_at: Set(None),
    }
    .insert(app.db())
    .await
    .expect("invoice line");

    let uri = format!("/api/v1/notes/purchaseInvoiceLine/{}", line_id);
    let response = app.request(Method::GET, &uri, None, Some(&token)).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(json_body(response).await["tabs"], json!(["internal"]));

    let response = app
        .request(
            Method::PUT,
            &format!("{}/external", uri),
            Some(json!({ "content": paragraph("visible to supplier") })),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::PUT,
            &format!("{}/internal", uri),
            Some(json!({ "content": paragraph("short shipped by 20") })),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::ACCEPTED);
    let response = app
        .request(Method::POST, &format!("{}/flush", uri), None, Some(&token))
        .await;
    assert_eq!(json_body(response).await["flushed"], 1);

    let line = purchase_invoice_line::Entity::find_by_id(line_id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line.internal_notes, Some(paragraph("short shipped by 20")));
    assert!(line.external_notes.is_none());

    // the invoice header keeps both tabs
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/notes/purchaseInvoice/{}", invoice_id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(
        json_body(response).await["tabs"],
        json!(["internal", "external"])
    );
}

#[tokio::test]
async fn receipt_without_interaction_cannot_take_images() {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use erp_api::models::receipt;
    use sea_orm::{ActiveModelTrait, Set};
    use uuid::Uuid;

    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let receipt_id = Uuid::new_v4();
    receipt::ActiveModel {
        id: Set(receipt_id),
        receipt_id: Set("RE000042".to_string()),
        company_id: Set(fixture.company_id),
        supplier_id: Set(Some(fixture.supplier_id)),
        supplier_interaction_id: Set(None),
        internal_notes: Set(None),
        external_notes: Set(None),
        updated_by: Set(None),
        updated_at: Set(None),
    }
    .insert(app.db())
    .await
    .expect("receipt");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/notes/receipt/{}/images", receipt_id),
            Some(json!({
                "file_name": "damage.png",
                "content_type": "image/png",
                "content": STANDARD.encode([0x89u8, 0x50, 0x4E, 0x47]),
            })),
            Some(&token),
        )
        .await;

    assert_ne!(response.status(), StatusCode::CREATED);
    assert_eq!(app.storage.len(), 0);
}
