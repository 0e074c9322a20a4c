//! Saved views: debounced reordering and confirmed deletes.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, json_body, TestApp};
use erp_api::models::saved_view;
use sea_orm::{EntityTrait, QueryOrder};
use serde_json::json;
use uuid::Uuid;

async fn stored_order(app: &TestApp) -> Vec<(Uuid, i32)> {
    saved_view::Entity::find()
        .order_by_asc(saved_view::Column::SortOrder)
        .all(app.db())
        .await
        .expect("list saved views")
        .into_iter()
        .map(|v| (v.id, v.sort_order))
        .collect()
}

#[tokio::test]
async fn reorder_answers_at_once_and_writes_on_flush() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let active = app.seed_saved_view(&fixture, "Active", 0).await;
    let leavers = app.seed_saved_view(&fixture, "Leavers", 1).await;
    let interns = app.seed_saved_view(&fixture, "Interns", 2).await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/saved-views/order",
            Some(json!({
                "group_key": "employee",
                "view_ids": [interns, active, leavers],
            })),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    let positions = json_body(response).await;
    assert_eq!(positions[0]["id"], interns.to_string());
    assert_eq!(positions[0]["sort_order"], 0);
    assert_eq!(positions[2]["id"], leavers.to_string());
    assert_eq!(positions[2]["sort_order"], 2);

    // the rows keep their old order until the write happens
    assert_eq!(
        stored_order(&app).await,
        vec![(active, 0), (leavers, 1), (interns, 2)]
    );

    let response = app
        .request(
            Method::POST,
            "/api/v1/saved-views/order/flush?group=employee",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(json_body(response).await["flushed"], true);
    assert_eq!(
        stored_order(&app).await,
        vec![(interns, 0), (active, 1), (leavers, 2)]
    );
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let active = app.seed_saved_view(&fixture, "Active", 0).await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/saved-views/order",
            Some(json!({ "group_key": "employee", "view_ids": [active, active] })),
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_without_confirmation_keeps_the_view() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let view = app.seed_saved_view(&fixture, "Leavers", 0).await;

    let prompt = app
        .request(
            Method::GET,
            &format!("/api/v1/saved-views/{}/delete", view),
            None,
            Some(&token),
        )
        .await;
    assert_status(&prompt, StatusCode::OK);
    assert_eq!(
        json_body(prompt).await["message"],
        "Are you sure you want to delete the view \"Leavers\"?"
    );

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/saved-views/{}", view),
            Some(json!({})),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(response).await["errors"]["form"][0],
        "Deletion must be confirmed"
    );
    assert_eq!(stored_order(&app).await.len(), 1);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/saved-views/{}", view),
            Some(json!({ "confirm": true })),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    assert!(stored_order(&app).await.is_empty());
}

#[tokio::test]
async fn other_users_views_are_not_found() {
    let app = TestApp::new().await;
    let owner = app.seed().await;
    let other = app.seed().await;
    let view = app.seed_saved_view(&owner, "Active", 0).await;
    let token = app.token_for(&app.employee(&other));

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/saved-views/{}/delete", view),
            None,
            Some(&token),
        )
        .await;

    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn people_navigation_lists_views_under_their_route() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    app.seed_saved_view(&fixture, "Active", 0).await;

    let response = app
        .request(Method::GET, "/api/v1/navigation/people", None, Some(&token))
        .await;
    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await.to_string();
    assert!(body.contains("Active"));
    assert!(body.contains("/x/people?view=active"));
}

#[tokio::test]
async fn unknown_ids_are_rejected_before_queueing() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let active = app.seed_saved_view(&fixture, "Active", 0).await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/saved-views/order",
            Some(json!({ "group_key": "employee", "view_ids": [active, Uuid::new_v4()] })),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["errors"]["form"][0]
        .as_str()
        .expect("message")
        .contains("is not in this group"));

    let response = app
        .request(
            Method::POST,
            "/api/v1/saved-views/order/flush?group=employee",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(json_body(response).await["flushed"], false);
}

#[tokio::test]
async fn delete_then_create_keeps_positions_unique() {
    let app = TestApp::new().await;
    let fixture = app.seed().await;
    let token = app.token_for(&app.employee(&fixture));
    let active = app.seed_saved_view(&fixture, "Active", 0).await;
    let leavers = app.seed_saved_view(&fixture, "Leavers", 1).await;
    let interns = app.seed_saved_view(&fixture, "Interns", 2).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/saved-views/{}", active),
            Some(json!({ "confirm": true })),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(stored_order(&app).await, vec![(leavers, 0), (interns, 1)]);

    let response = app
        .request(
            Method::POST,
            "/api/v1/saved-views",
            Some(json!({
                "group_key": "employee",
                "name": "Contractors",
                "path": "/x/people?view=contractors",
            })),
            Some(&token),
        )
        .await;
    assert_status(&response, StatusCode::CREATED);
    let created: Uuid = serde_json::from_value(json_body(response).await["id"].clone())
        .expect("created id");

    assert_eq!(
        stored_order(&app).await,
        vec![(leavers, 0), (interns, 1), (created, 2)]
    );
}
