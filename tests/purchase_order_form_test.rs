//! Purchase order form submissions and the one-shot flash cookie.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{assert_status, json_body, location, TestApp};
use erp_api::flash::{Flash, FLASH_COOKIE};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn details_update_redirects_with_success_flash() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));

    let response = app
        .request(
            Method::POST,
            &format!(
                "/api/v1/purchase-orders/{}/details",
                fixture.purchase_order_id
            ),
            Some(json!({
                "supplier_id": fixture.supplier_id,
                "supplier_contact_id": fixture.contact_id,
                "supplier_reference": "Q-7781",
                "order_date": "2026-03-09",
                "currency_code": "EUR",
                "exchange_rate": "1.25",
            })),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some(format!("/x/purchase-order/{}", fixture.purchase_order_id).as_str())
    );
    assert_eq!(
        app.flash_of(&response).map(|f| f.message),
        Some("Updated purchase order".to_string())
    );

    let order = app.purchase_order(fixture.purchase_order_id).await;
    assert_eq!(order.currency_code, "EUR");
    assert_eq!(order.exchange_rate, Decimal::new(125, 2));
    assert_eq!(order.supplier_reference.as_deref(), Some("Q-7781"));
    assert_eq!(order.updated_by, Some(fixture.user_id));
}

#[tokio::test]
async fn invalid_details_are_rejected_without_mutation() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));

    let response = app
        .request(
            Method::POST,
            &format!(
                "/api/v1/purchase-orders/{}/details",
                fixture.purchase_order_id
            ),
            Some(json!({
                "supplier_id": fixture.supplier_id,
                "order_date": "2026-03-09",
                "currency_code": "EURO",
                "exchange_rate": "0",
            })),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["errors"]["exchange_rate"].is_array());
    assert_eq!(
        body["errors"]["currency_code"][0],
        "Currency code must be 3 letters"
    );

    let order = app.purchase_order(fixture.purchase_order_id).await;
    assert_eq!(order.currency_code, "USD");
    assert_eq!(order.exchange_rate, Decimal::ONE);
    assert!(order.updated_at.is_none());
}

#[tokio::test]
async fn details_page_shows_and_clears_a_valid_flash() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let cookie = format!(
        "{}={}",
        FLASH_COOKIE,
        app.state
            .flash
            .encode(&Flash::success("Purchase order released"))
            .expect("encode flash")
    );

    let response = app
        .request_with_headers(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}", fixture.purchase_order_id),
            None,
            Some(&token),
            &[("cookie", cookie.as_str())],
        )
        .await;

    assert_status(&response, StatusCode::OK);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("flash cookie cleared");
    assert!(cleared.starts_with("__flash=;"));
    assert!(cleared.contains("Max-Age=0"));

    let body = json_body(response).await;
    assert_eq!(body["flash"]["message"], "Purchase order released");
    assert_eq!(body["flash"]["kind"], "success");
}

#[tokio::test]
async fn tampered_flash_is_ignored_and_cleared() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let genuine = app
        .state
        .flash
        .encode(&Flash::success("Updated purchase order"))
        .expect("encode flash");
    // flip the first character of the signed value
    let mut tampered: Vec<char> = genuine.chars().collect();
    tampered[0] = if tampered[0] == 'A' { 'B' } else { 'A' };
    let cookie = format!("{}={}", FLASH_COOKIE, tampered.into_iter().collect::<String>());

    let response = app
        .request_with_headers(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}", fixture.purchase_order_id),
            None,
            Some(&token),
            &[("cookie", cookie.as_str())],
        )
        .await;

    assert_status(&response, StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    let body = json_body(response).await;
    assert!(body["flash"].is_null());
}

#[tokio::test]
async fn missing_purchase_order_redirects_to_the_list() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/purchase-orders/{}", uuid::Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/x/purchasing/orders"));
    assert!(app.flash_of(&response).expect("flash").is_error());
}

#[tokio::test]
async fn released_orders_reject_delivery_changes() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));

    app.request(
        Method::POST,
        &format!(
            "/api/v1/purchase-orders/{}/release",
            fixture.purchase_order_id
        ),
        Some(json!({})),
        Some(&token),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            &format!(
                "/api/v1/purchase-orders/{}/delivery",
                fixture.purchase_order_id
            ),
            Some(json!({ "supplier_shipping_cost": "12.50", "drop_shipment": false })),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::SEE_OTHER);
    assert!(app.flash_of(&response).expect("flash").is_error());
}
