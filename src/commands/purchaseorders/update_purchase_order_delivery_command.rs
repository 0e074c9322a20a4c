use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{find_purchase_order, validate_non_negative};
use crate::{
    auth::Role,
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::purchase_order_delivery,
};

pub const DELIVERY_LOCKED: &str =
    "Purchase order delivery can only be changed while Draft or To Review";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderDeliveryForm {
    pub location_id: Option<Uuid>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "0")]
    #[serde(default)]
    pub supplier_shipping_cost: Decimal,
    pub shipping_method_id: Option<Uuid>,
    pub shipping_term_id: Option<Uuid>,
    #[validate(length(max = 255, message = "Tracking number is too long"))]
    pub tracking_number: Option<String>,
    pub receipt_requested_date: Option<NaiveDate>,
    pub receipt_promised_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub drop_shipment: bool,
    pub customer_id: Option<Uuid>,
    pub customer_location_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UpdatePurchaseOrderDeliveryCommand {
    pub id: Uuid,
    pub company_id: Uuid,
    pub updated_by: Uuid,
    pub role: Role,
    pub form: PurchaseOrderDeliveryForm,
}

fn apply(
    row: &mut purchase_order_delivery::ActiveModel,
    form: &PurchaseOrderDeliveryForm,
    role: Role,
    updated_by: Uuid,
) {
    // suppliers see the ship-to location read-only
    if role != Role::Supplier {
        row.location_id = Set(form.location_id);
    }
    row.supplier_shipping_cost = Set(form.supplier_shipping_cost);
    row.shipping_method_id = Set(form.shipping_method_id);
    row.shipping_term_id = Set(form.shipping_term_id);
    row.tracking_number = Set(form.tracking_number.clone());
    row.receipt_requested_date = Set(form.receipt_requested_date);
    row.receipt_promised_date = Set(form.receipt_promised_date);
    row.delivery_date = Set(form.delivery_date);
    row.notes = Set(form.notes.clone());
    row.drop_shipment = Set(form.drop_shipment);
    if form.drop_shipment {
        row.customer_id = Set(form.customer_id);
        row.customer_location_id = Set(form.customer_location_id);
    } else {
        row.customer_id = Set(None);
        row.customer_location_id = Set(None);
    }
    row.updated_by = Set(Some(updated_by));
    row.updated_at = Set(Some(Utc::now()));
}

#[async_trait]
impl Command for UpdatePurchaseOrderDeliveryCommand {
    type Result = purchase_order_delivery::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;

        let id = self.id;
        let company_id = self.company_id;
        let form = self.form.clone();
        let role = self.role;
        let updated_by = self.updated_by;

        let saved = db_pool
            .transaction::<_, purchase_order_delivery::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let order = find_purchase_order(txn, id, company_id).await?;
                    if !order.status.is_editable() {
                        return Err(ServiceError::InvalidStatus(DELIVERY_LOCKED.to_string()));
                    }

                    match purchase_order_delivery::Entity::find_by_id(id).one(txn).await? {
                        Some(existing) => {
                            let mut row: purchase_order_delivery::ActiveModel = existing.into();
                            apply(&mut row, &form, role, updated_by);
                            Ok(row.update(txn).await?)
                        }
                        None => {
                            let mut row = purchase_order_delivery::ActiveModel {
                                id: Set(id),
                                company_id: Set(company_id),
                                location_id: Set(None),
                                ..Default::default()
                            };
                            apply(&mut row, &form, role, updated_by);
                            Ok(row.insert(txn).await?)
                        }
                    }
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => db_err.into(),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(purchase_order_id = %id, "purchase order delivery updated");
        event_sender
            .send_or_log(Event::PurchaseOrderDeliveryUpdated(id))
            .await;

        Ok(saved)
    }
}
