#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{NaiveDate, Utc};
use erp_api::{
    auth::{AuthUser, PermissionMatrix, Role},
    config::AppConfig,
    db,
    documents::StaticPdfRenderer,
    events::{self, EventSender},
    flash::Flash,
    handlers::Adapters,
    logging::discard_logger,
    message_queue::InMemoryMessageQueue,
    models::{
        company, purchase_order, purchase_order_delivery, purchase_order_line,
        purchase_order_payment, saved_view, supplier, supplier_contact, supplier_interaction,
        user, PurchaseOrderStatus,
    },
    storage::InMemoryStorage,
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str =
    "integration_test_secret_that_is_long_enough_for_the_sixty_four_char_minimum";

/// Harness around the full router backed by a throwaway SQLite file
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub renderer: Arc<StaticPdfRenderer>,
    pub storage: Arc<InMemoryStorage>,
    pub queue: Arc<InMemoryMessageQueue>,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

/// One company with a buyer, a supplier and a Draft purchase order
pub struct Fixture {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub supplier_id: Uuid,
    pub contact_id: Uuid,
    pub purchase_order_id: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Builds the app after letting the caller adjust the configuration
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir");
        let db_path = db_dir.path().join("erp_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        // long enough that no timer fires during a test
        cfg.notes.debounce_ms = 60_000;
        cfg.saved_views.debounce_ms = 60_000;
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let renderer = Arc::new(StaticPdfRenderer::new());
        let storage = InMemoryStorage::new();
        let queue = Arc::new(InMemoryMessageQueue::new());
        let adapters = Adapters {
            renderer: renderer.clone(),
            storage: storage.clone(),
            queue: queue.clone(),
        };

        let logger = discard_logger();
        let state = AppState::new(db_arc, cfg, Arc::new(event_sender), adapters, &logger)
            .expect("valid app state");
        let router = erp_api::app_router(state.clone(), logger);

        Self {
            router,
            state,
            renderer,
            storage,
            queue,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    pub fn db(&self) -> &db::DbPool {
        self.state.db.as_ref()
    }

    pub fn employee(&self, fixture: &Fixture) -> AuthUser {
        AuthUser::new(
            fixture.user_id,
            fixture.company_id,
            Role::Employee,
            PermissionMatrix::full(),
        )
    }

    pub fn token_for(&self, user: &AuthUser) -> String {
        self.state
            .auth
            .issue_token(user)
            .expect("token can be issued")
    }

    pub async fn seed(&self) -> Fixture {
        let db = self.db();
        let company_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let supplier_id = Uuid::new_v4();
        let contact_id = Uuid::new_v4();
        let interaction_id = Uuid::new_v4();
        let purchase_order_id = Uuid::new_v4();
        let now = Utc::now();

        company::ActiveModel {
            id: Set(company_id),
            name: Set("Acme Fabrication".to_string()),
            email: Set(Some("purchasing@acme.test".to_string())),
            phone: Set(None),
            address_line1: Set(Some("1 Foundry Way".to_string())),
            city: Set(Some("Springfield".to_string())),
            postal_code: Set(None),
            country_code: Set(Some("US".to_string())),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .expect("company");

        user::ActiveModel {
            id: Set(user_id),
            email: Set("buyer@acme.test".to_string()),
            full_name: Set(Some("Dana Buyer".to_string())),
            company_id: Set(company_id),
            active: Set(true),
            deactivated_at: Set(None),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .expect("user");

        supplier::ActiveModel {
            id: Set(supplier_id),
            company_id: Set(company_id),
            name: Set("Bolt Supply Co".to_string()),
            supplier_status: Set(Some("Active".to_string())),
            tax_id: Set(None),
            currency_code: Set(Some("USD".to_string())),
            website: Set(None),
            created_by: Set(user_id),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .expect("supplier");

        supplier_contact::ActiveModel {
            id: Set(contact_id),
            supplier_id: Set(supplier_id),
            company_id: Set(company_id),
            email: Set("orders@bolt.test".to_string()),
            full_name: Set(Some("Sam Seller".to_string())),
        }
        .insert(db)
        .await
        .expect("supplier contact");

        supplier_interaction::ActiveModel {
            id: Set(interaction_id),
            company_id: Set(company_id),
            supplier_id: Set(supplier_id),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .expect("supplier interaction");

        purchase_order::ActiveModel {
            id: Set(purchase_order_id),
            purchase_order_id: Set("PO000123".to_string()),
            company_id: Set(company_id),
            supplier_id: Set(supplier_id),
            supplier_interaction_id: Set(interaction_id),
            supplier_contact_id: Set(Some(contact_id)),
            supplier_reference: Set(None),
            status: Set(PurchaseOrderStatus::Draft),
            order_date: Set(NaiveDate::from_ymd_opt(2026, 3, 2).expect("date")),
            currency_code: Set("USD".to_string()),
            exchange_rate: Set(Decimal::ONE),
            internal_notes: Set(None),
            external_notes: Set(None),
            custom_fields: Set(None),
            created_by: Set(user_id),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(None),
            released_by: Set(None),
            released_at: Set(None),
        }
        .insert(db)
        .await
        .expect("purchase order");

        purchase_order_delivery::ActiveModel {
            id: Set(purchase_order_id),
            company_id: Set(company_id),
            location_id: Set(None),
            supplier_shipping_cost: Set(Decimal::ZERO),
            shipping_method_id: Set(None),
            shipping_term_id: Set(None),
            tracking_number: Set(None),
            receipt_requested_date: Set(None),
            receipt_promised_date: Set(None),
            delivery_date: Set(None),
            notes: Set(None),
            drop_shipment: Set(false),
            customer_id: Set(None),
            customer_location_id: Set(None),
            updated_by: Set(None),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .expect("delivery");

        purchase_order_payment::ActiveModel {
            id: Set(purchase_order_id),
            company_id: Set(company_id),
            invoice_supplier_id: Set(Some(supplier_id)),
            invoice_supplier_contact_id: Set(None),
            invoice_supplier_location_id: Set(None),
            payment_term_id: Set(None),
            payment_complete: Set(false),
            updated_by: Set(None),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .expect("payment");

        purchase_order_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(purchase_order_id),
            company_id: Set(company_id),
            description: Set("M8 hex bolts".to_string()),
            quantity: Set(Decimal::new(500, 0)),
            unit_price: Set(Decimal::new(12, 2)),
            internal_notes: Set(None),
            external_notes: Set(None),
            updated_by: Set(None),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .expect("line");

        Fixture {
            company_id,
            user_id,
            supplier_id,
            contact_id,
            purchase_order_id,
        }
    }

    pub async fn seed_saved_view(&self, fixture: &Fixture, name: &str, sort_order: i32) -> Uuid {
        let id = Uuid::new_v4();
        saved_view::ActiveModel {
            id: Set(id),
            user_id: Set(fixture.user_id),
            company_id: Set(fixture.company_id),
            group_key: Set("employee".to_string()),
            name: Set(name.to_string()),
            path: Set(format!("/x/people?view={}", name.to_ascii_lowercase())),
            sort_order: Set(sort_order),
            created_at: Set(Utc::now()),
        }
        .insert(self.db())
        .await
        .expect("saved view");
        id
    }

    pub async fn purchase_order(&self, id: Uuid) -> purchase_order::Model {
        purchase_order::Entity::find_by_id(id)
            .one(self.db())
            .await
            .expect("query purchase order")
            .expect("purchase order exists")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        self.request_with_headers(method, uri, body, token, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize json body"))
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request")
    }

    /// Decodes the flash cookie set on a redirect
    pub fn flash_of(&self, response: &Response) -> Option<Flash> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| self.state.flash.decode_set_cookie(v))
    }
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "unexpected status for response with headers {:?}",
        response.headers()
    );
}
