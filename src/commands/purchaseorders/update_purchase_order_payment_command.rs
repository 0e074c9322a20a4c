use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::find_purchase_order;
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::purchase_order_payment,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderPaymentForm {
    pub invoice_supplier_id: Option<Uuid>,
    pub invoice_supplier_contact_id: Option<Uuid>,
    pub invoice_supplier_location_id: Option<Uuid>,
    pub payment_term_id: Option<Uuid>,
    #[serde(default)]
    pub payment_complete: bool,
}

#[derive(Debug, Clone)]
pub struct UpdatePurchaseOrderPaymentCommand {
    pub id: Uuid,
    pub company_id: Uuid,
    pub updated_by: Uuid,
    pub form: PurchaseOrderPaymentForm,
}

#[async_trait]
impl Command for UpdatePurchaseOrderPaymentCommand {
    type Result = purchase_order_payment::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let db = db_pool.as_ref();
        find_purchase_order(db, self.id, self.company_id).await?;

        let existing = purchase_order_payment::Entity::find_by_id(self.id)
            .one(db)
            .await?;
        let is_new = existing.is_none();
        let mut row: purchase_order_payment::ActiveModel = match existing {
            Some(existing) => existing.into(),
            None => purchase_order_payment::ActiveModel {
                id: Set(self.id),
                company_id: Set(self.company_id),
                ..Default::default()
            },
        };
        row.invoice_supplier_id = Set(self.form.invoice_supplier_id);
        row.invoice_supplier_contact_id = Set(self.form.invoice_supplier_contact_id);
        row.invoice_supplier_location_id = Set(self.form.invoice_supplier_location_id);
        row.payment_term_id = Set(self.form.payment_term_id);
        row.payment_complete = Set(self.form.payment_complete);
        row.updated_by = Set(Some(self.updated_by));
        row.updated_at = Set(Some(Utc::now()));

        let saved = if is_new {
            row.insert(db).await?
        } else {
            row.update(db).await?
        };

        info!(purchase_order_id = %self.id, "purchase order payment updated");
        event_sender
            .send_or_log(Event::PurchaseOrderPaymentUpdated(self.id))
            .await;
        Ok(saved)
    }
}
