use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use serde_json::Value;
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    commands::purchaseorders::{
        update_purchase_order_delivery_command::DELIVERY_LOCKED, PurchaseOrderDeliveryForm,
        PurchaseOrderDetailsForm, PurchaseOrderPaymentForm, UpdatePurchaseOrderDeliveryCommand,
        UpdatePurchaseOrderDetailsCommand, UpdatePurchaseOrderPaymentCommand,
    },
    commands::Command,
    db::DbPool,
    errors::{RequiredStep, ServiceError, StepContext, StepError},
    events::EventSender,
    models::{
        purchase_order, purchase_order_delivery, purchase_order_line, purchase_order_payment,
    },
    rich_text,
};

pub const LOAD_FAILED: &str = "Failed to load purchase order";
pub const LOAD_PAYMENT_FAILED: &str = "Failed to load purchase order payment";
pub const LOAD_DELIVERY_FAILED: &str = "Failed to load purchase order delivery";
pub const LOAD_LINES_FAILED: &str = "Failed to load purchase order lines";
pub const UPDATE_FAILED: &str = "Failed to update purchase order";
pub const UPDATE_DELIVERY_FAILED: &str = "Failed to update purchase order delivery";
pub const UPDATE_PAYMENT_FAILED: &str = "Failed to update purchase order payment";

/// View model of the purchase order details page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseOrderDetails {
    #[schema(value_type = Object)]
    pub purchase_order: purchase_order::Model,
    #[schema(value_type = Object)]
    pub payment: purchase_order_payment::Model,
    #[schema(value_type = Option<Object>)]
    pub delivery: Option<purchase_order_delivery::Model>,
    #[schema(value_type = Vec<Object>)]
    pub lines: Vec<purchase_order_line::Model>,
    pub internal_notes: Value,
    pub external_notes: Value,
    pub delivery_editable: bool,
}

/// Loader and per-section updates of purchase orders
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Runs the four page queries concurrently and fails on the first error
    #[instrument(skip(self, user), fields(company_id = %user.company_id))]
    pub async fn load_details(
        &self,
        id: Uuid,
        user: &AuthUser,
    ) -> Result<PurchaseOrderDetails, StepError> {
        let db = self.db_pool.as_ref();
        let company_id = user.company_id;

        let order = async {
            purchase_order::Entity::find_by_id(id)
                .filter(purchase_order::Column::CompanyId.eq(company_id))
                .one(db)
                .await
                .required(LOAD_FAILED)
        };
        let payment = async {
            purchase_order_payment::Entity::find_by_id(id)
                .filter(purchase_order_payment::Column::CompanyId.eq(company_id))
                .one(db)
                .await
                .required(LOAD_PAYMENT_FAILED)
        };
        let delivery = async {
            purchase_order_delivery::Entity::find_by_id(id)
                .filter(purchase_order_delivery::Column::CompanyId.eq(company_id))
                .one(db)
                .await
                .step(LOAD_DELIVERY_FAILED)
        };
        let lines = async {
            purchase_order_line::Entity::find()
                .filter(purchase_order_line::Column::PurchaseOrderId.eq(id))
                .filter(purchase_order_line::Column::CompanyId.eq(company_id))
                .order_by_asc(purchase_order_line::Column::Description)
                .all(db)
                .await
                .step(LOAD_LINES_FAILED)
        };

        let (purchase_order, payment, delivery, lines) =
            tokio::try_join!(order, payment, delivery, lines)?;

        let internal_notes = if user.is_employee() {
            purchase_order
                .internal_notes
                .clone()
                .unwrap_or_else(rich_text::empty_document)
        } else {
            rich_text::empty_document()
        };
        let external_notes = purchase_order
            .external_notes
            .clone()
            .unwrap_or_else(rich_text::empty_document);

        Ok(PurchaseOrderDetails {
            delivery_editable: purchase_order.status.is_editable(),
            purchase_order,
            payment,
            delivery,
            lines,
            internal_notes,
            external_notes,
        })
    }

    #[instrument(skip(self, user, form))]
    pub async fn update_details(
        &self,
        id: Uuid,
        user: &AuthUser,
        form: PurchaseOrderDetailsForm,
    ) -> Result<purchase_order::Model, StepError> {
        let updated = UpdatePurchaseOrderDetailsCommand {
            id,
            company_id: user.company_id,
            updated_by: user.user_id,
            form,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
        .step(UPDATE_FAILED)?;
        slog::info!(self.logger, "purchase order updated"; "purchase_order_id" => %id, "user_id" => %user.user_id);
        Ok(updated)
    }

    #[instrument(skip(self, user, form))]
    pub async fn update_delivery(
        &self,
        id: Uuid,
        user: &AuthUser,
        form: PurchaseOrderDeliveryForm,
    ) -> Result<purchase_order_delivery::Model, StepError> {
        UpdatePurchaseOrderDeliveryCommand {
            id,
            company_id: user.company_id,
            updated_by: user.user_id,
            role: user.role,
            form,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
        .map_err(|e| match e {
            ServiceError::InvalidStatus(_) => StepError::new(DELIVERY_LOCKED, e),
            other => StepError::new(UPDATE_DELIVERY_FAILED, other),
        })
    }

    #[instrument(skip(self, user, form))]
    pub async fn update_payment(
        &self,
        id: Uuid,
        user: &AuthUser,
        form: PurchaseOrderPaymentForm,
    ) -> Result<purchase_order_payment::Model, StepError> {
        UpdatePurchaseOrderPaymentCommand {
            id,
            company_id: user.company_id,
            updated_by: user.user_id,
            form,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
        .step(UPDATE_PAYMENT_FAILED)
    }
}
