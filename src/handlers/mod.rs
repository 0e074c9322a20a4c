pub mod common;
pub mod health;
pub mod items;
pub mod notes;
pub mod paths;
pub mod purchase_orders;
pub mod sales;
pub mod saved_views;
pub mod schedule;
pub mod suppliers;
pub mod users;

use slog::Logger;
use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    debounce::FlushSummary,
    documents::DocumentRenderer,
    events::EventSender,
    logging::component_logger,
    message_queue::MessageQueue,
    services::{
        items::ItemService,
        notes::{NoteService, NoteSettings},
        purchase_orders::PurchaseOrderService,
        release::{ReleaseService, ReleaseSettings},
        sales::SalesService,
        saved_views::SavedViewService,
        schedule::ScheduleService,
        suppliers::SupplierService,
    },
    storage::ObjectStorage,
    tasks::TaskQueue,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// External systems the services talk to, chosen at startup
#[derive(Clone)]
pub struct Adapters {
    pub renderer: Arc<dyn DocumentRenderer>,
    pub storage: Arc<dyn ObjectStorage>,
    pub queue: Arc<dyn MessageQueue>,
}

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub release: Arc<ReleaseService>,
    pub notes: Arc<NoteService>,
    pub schedule: Arc<ScheduleService>,
    pub saved_views: Arc<SavedViewService>,
    pub suppliers: Arc<SupplierService>,
    pub items: Arc<ItemService>,
    pub sales: Arc<SalesService>,
    pub tasks: TaskQueue,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        adapters: Adapters,
        config: &AppConfig,
        logger: &Logger,
    ) -> Self {
        let tasks = TaskQueue::new(adapters.queue.clone());

        let purchase_orders = Arc::new(PurchaseOrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "purchase_order_service"),
        ));
        let release = Arc::new(ReleaseService::new(
            db_pool.clone(),
            event_sender.clone(),
            adapters.renderer.clone(),
            adapters.storage.clone(),
            tasks.clone(),
            ReleaseSettings::from(config),
            component_logger(logger, "release_service"),
        ));
        let notes = Arc::new(NoteService::new(
            db_pool.clone(),
            event_sender.clone(),
            adapters.storage.clone(),
            NoteSettings {
                quiet_period: config.notes.quiet_period(),
                bucket: config.storage.bucket.clone(),
            },
            component_logger(logger, "note_service"),
        ));
        let schedule = Arc::new(ScheduleService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "schedule_service"),
        ));
        let saved_views = Arc::new(SavedViewService::new(
            db_pool.clone(),
            event_sender.clone(),
            config.saved_views.quiet_period(),
            component_logger(logger, "saved_view_service"),
        ));
        let suppliers = Arc::new(SupplierService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "supplier_service"),
        ));
        let items = Arc::new(ItemService::new(
            db_pool.clone(),
            event_sender.clone(),
            component_logger(logger, "item_service"),
        ));
        let sales = Arc::new(SalesService::new(
            db_pool,
            event_sender,
            component_logger(logger, "sales_service"),
        ));

        Self {
            purchase_orders,
            release,
            notes,
            schedule,
            saved_views,
            suppliers,
            items,
            sales,
            tasks,
        }
    }

    /// Attempts every pending debounced value in both buffers, used on shutdown
    pub async fn flush_pending(&self) -> FlushSummary {
        let notes = self.notes.pending().flush_all().await;
        let views = self.saved_views.pending().flush_all().await;
        notes + views
    }
}
