use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{find_purchase_order, validate_positive};
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{purchase_order, supplier, supplier_contact},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderDetailsForm {
    pub supplier_id: Uuid,
    pub supplier_contact_id: Option<Uuid>,
    #[validate(length(max = 255, message = "Supplier reference is too long"))]
    pub supplier_reference: Option<String>,
    pub order_date: NaiveDate,
    #[validate(length(equal = 3, message = "Currency code must be 3 letters"))]
    pub currency_code: String,
    #[validate(custom = "validate_positive")]
    #[schema(value_type = String, example = "1.0")]
    pub exchange_rate: Decimal,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct UpdatePurchaseOrderDetailsCommand {
    pub id: Uuid,
    pub company_id: Uuid,
    pub updated_by: Uuid,
    pub form: PurchaseOrderDetailsForm,
}

#[async_trait]
impl Command for UpdatePurchaseOrderDetailsCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let db = db_pool.as_ref();

        let order = find_purchase_order(db, self.id, self.company_id).await?;

        supplier::Entity::find_by_id(self.form.supplier_id)
            .filter(supplier::Column::CompanyId.eq(self.company_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Supplier not found".into()))?;

        if let Some(contact_id) = self.form.supplier_contact_id {
            supplier_contact::Entity::find_by_id(contact_id)
                .filter(supplier_contact::Column::SupplierId.eq(self.form.supplier_id))
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError("Supplier contact not found".into())
                })?;
        }

        let mut active: purchase_order::ActiveModel = order.into();
        active.supplier_id = Set(self.form.supplier_id);
        active.supplier_contact_id = Set(self.form.supplier_contact_id);
        active.supplier_reference = Set(self.form.supplier_reference.clone());
        active.order_date = Set(self.form.order_date);
        active.currency_code = Set(self.form.currency_code.to_ascii_uppercase());
        active.exchange_rate = Set(self.form.exchange_rate);
        if self.form.custom_fields.is_some() {
            active.custom_fields = Set(self.form.custom_fields.clone());
        }
        active.updated_by = Set(Some(self.updated_by));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(purchase_order_id = %self.id, "purchase order details updated");
        event_sender
            .send_or_log(Event::PurchaseOrderUpdated(self.id))
            .await;

        Ok(updated)
    }
}
