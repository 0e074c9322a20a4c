use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{purchaseorders::validate_positive, Command},
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{sales_rfq, sales_rfq_line},
};

/// New line on a sales RFQ. A submitted `id` is ignored; lines always get a
/// fresh one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SalesRfqLineForm {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 255, message = "Customer part is required"))]
    pub customer_part_id: String,
    #[validate(length(max = 64, message = "Revision is too long"))]
    pub customer_part_revision: Option<String>,
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
    pub item_id: Option<Uuid>,
    #[validate(custom = "validate_positive")]
    #[schema(value_type = String, example = "25")]
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 16, message = "Unit of measure is required"))]
    pub unit_of_measure_code: String,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct CreateSalesRfqLineCommand {
    pub sales_rfq_id: Uuid,
    pub company_id: Uuid,
    pub created_by: Uuid,
    pub form: SalesRfqLineForm,
}

#[async_trait]
impl Command for CreateSalesRfqLineCommand {
    type Result = sales_rfq_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(sales_rfq_id = %self.sales_rfq_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let db = db_pool.as_ref();

        sales_rfq::Entity::find_by_id(self.sales_rfq_id)
            .filter(sales_rfq::Column::CompanyId.eq(self.company_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("sales RFQ", self.sales_rfq_id))?;

        let line = sales_rfq_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            sales_rfq_id: Set(self.sales_rfq_id),
            company_id: Set(self.company_id),
            customer_part_id: Set(self.form.customer_part_id.trim().to_string()),
            customer_part_revision: Set(self.form.customer_part_revision.clone()),
            description: Set(self.form.description.clone()),
            item_id: Set(self.form.item_id),
            quantity: Set(self.form.quantity),
            unit_of_measure_code: Set(self.form.unit_of_measure_code.to_ascii_uppercase()),
            custom_fields: Set(self.form.custom_fields.clone()),
            created_by: Set(self.created_by),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(sales_rfq_id = %self.sales_rfq_id, line_id = %line.id, "sales RFQ line created");
        event_sender
            .send_or_log(Event::SalesRfqLineCreated {
                sales_rfq_id: self.sales_rfq_id,
                line_id: line.id,
            })
            .await;
        Ok(line)
    }
}
