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

use super::merge_custom_fields;
use crate::{
    commands::{purchaseorders::validate_non_negative, Command},
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{item_cost, item_posting_group, CostingMethod},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemCostForm {
    pub costing_method: CostingMethod,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "4.25")]
    pub standard_cost: Decimal,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "4.10")]
    pub unit_cost: Decimal,
    #[serde(default)]
    pub cost_is_adjusted: bool,
    pub item_posting_group_id: Option<Uuid>,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct UpdateItemCostCommand {
    pub item_id: Uuid,
    pub company_id: Uuid,
    pub updated_by: Uuid,
    pub form: ItemCostForm,
}

#[async_trait]
impl Command for UpdateItemCostCommand {
    type Result = item_cost::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(item_id = %self.item_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let db = db_pool.as_ref();

        let existing = item_cost::Entity::find_by_id(self.item_id)
            .filter(item_cost::Column::CompanyId.eq(self.company_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("item cost", self.item_id))?;

        if let Some(group_id) = self.form.item_posting_group_id {
            item_posting_group::Entity::find_by_id(group_id)
                .filter(item_posting_group::Column::CompanyId.eq(self.company_id))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::ValidationError("Posting group not found".into()))?;
        }

        let custom_fields =
            merge_custom_fields(existing.custom_fields.clone(), &self.form.custom_fields);
        let mut active: item_cost::ActiveModel = existing.into();
        active.costing_method = Set(self.form.costing_method);
        active.standard_cost = Set(self.form.standard_cost);
        active.unit_cost = Set(self.form.unit_cost);
        active.cost_is_adjusted = Set(self.form.cost_is_adjusted);
        active.item_posting_group_id = Set(self.form.item_posting_group_id);
        active.custom_fields = Set(custom_fields);
        active.updated_by = Set(Some(self.updated_by));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(item_id = %self.item_id, "item cost updated");
        event_sender
            .send_or_log(Event::ItemCostUpdated(self.item_id))
            .await;
        Ok(updated)
    }
}
