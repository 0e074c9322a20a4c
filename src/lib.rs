//! ERP API library
//!
//! Purchasing, items, sales, production scheduling and people workflows behind
//! one axum router: the purchase order release pipeline, debounced notes, the
//! Kanban aggregate and saved views.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod common;
pub mod config;
pub mod db;
pub mod debounce;
pub mod documents;
pub mod email;
pub mod errors;
pub mod events;
pub mod flash;
pub mod handlers;
pub mod logging;
pub mod message_queue;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod rich_text;
pub mod services;
pub mod storage;
pub mod tasks;
pub mod tracing;

use axum::{extract::FromRef, routing::get, Router};
use slog::Logger;
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

use crate::auth::{Action, AuthConfig, AuthRouterExt, AuthService, Module, Role};
use crate::handlers::{
    health, items, notes, purchase_orders, sales, saved_views, schedule, suppliers, users,
    Adapters, AppServices,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub flash: flash::FlashSigner,
}

impl AppState {
    pub fn new(
        db: Arc<db::DbPool>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
        adapters: Adapters,
        logger: &Logger,
    ) -> Result<Self, errors::ServiceError> {
        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            adapters,
            &config,
            logger,
        );
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        let flash = flash::FlashSigner::new(config.flash_secret())?;
        Ok(Self {
            db,
            config,
            event_sender,
            services,
            auth,
            flash,
        })
    }
}

impl FromRef<AppState> for flash::FlashSigner {
    fn from_ref(state: &AppState) -> Self {
        state.flash.clone()
    }
}

/// Every `/api/v1` route with its capability gate
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    let purchasing_read = purchase_orders::purchase_order_read_routes()
        .merge(notes::notes_routes())
        .with_capability(Action::View, Module::Purchasing);

    let purchasing_update = purchase_orders::purchase_order_write_routes()
        .with_capability(Action::Update, Module::Purchasing);

    // the capability layer runs first, then the role check
    let purchasing_release = purchase_orders::purchase_order_release_routes()
        .with_role(Role::Employee)
        .with_capability(Action::Create, Module::Purchasing);

    let schedule_read =
        schedule::schedule_read_routes().with_capability(Action::View, Module::Production);
    let schedule_write =
        schedule::schedule_write_routes().with_capability(Action::Update, Module::Production);

    let people_navigation =
        saved_views::people_navigation_routes().with_capability(Action::View, Module::People);

    // posting groups are also limited to employees
    let parts_read = items::item_read_routes()
        .merge(items::item_posting_group_read_routes().with_role(Role::Employee))
        .with_capability(Action::View, Module::Parts);
    let parts_update = items::item_write_routes().with_capability(Action::Update, Module::Parts);

    let sales_read = sales::quote_read_routes().with_capability(Action::View, Module::Sales);
    let sales_create =
        sales::sales_rfq_create_routes().with_capability(Action::Create, Module::Sales);

    let users_deactivate =
        users::user_deactivate_routes().with_capability(Action::Delete, Module::Users);
    let users_invite = users::user_invite_routes().with_capability(Action::Create, Module::Users);

    Router::new()
        .merge(purchasing_read)
        .merge(purchasing_update)
        .merge(purchasing_release)
        .merge(schedule_read)
        .merge(schedule_write)
        // per-user data, no module capability
        .merge(saved_views::saved_view_routes())
        .merge(people_navigation)
        .merge(parts_read)
        .merge(parts_update)
        .merge(sales_read)
        .merge(sales_create)
        // create vs update is decided by the submitted id
        .merge(suppliers::supplier_routes())
        .merge(users_deactivate)
        .merge(users_invite)
        .with_auth(auth)
}

/// Full application router: health, metrics, docs and the v1 API
pub fn app_router(state: AppState, logger: Logger) -> Router {
    let logging_state = Arc::new(logging::LoggingState::new(logger));

    Router::new()
        .merge(health::health_routes())
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .layer(CookieManagerLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            logging_state,
            logging::logging_middleware,
        ))
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        // outermost so every log line and span carries the id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
