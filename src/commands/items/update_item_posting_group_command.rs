use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::merge_custom_fields;
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::item_posting_group,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemPostingGroupForm {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct UpdateItemPostingGroupCommand {
    pub id: Uuid,
    pub company_id: Uuid,
    pub updated_by: Uuid,
    pub form: ItemPostingGroupForm,
}

#[async_trait]
impl Command for UpdateItemPostingGroupCommand {
    type Result = item_posting_group::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(item_posting_group_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let db = db_pool.as_ref();

        let existing = item_posting_group::Entity::find_by_id(self.id)
            .filter(item_posting_group::Column::CompanyId.eq(self.company_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("item posting group", self.id))?;

        let custom_fields =
            merge_custom_fields(existing.custom_fields.clone(), &self.form.custom_fields);
        let mut active: item_posting_group::ActiveModel = existing.into();
        active.name = Set(self.form.name.trim().to_string());
        active.description = Set(self
            .form
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string));
        active.custom_fields = Set(custom_fields);
        active.updated_by = Set(Some(self.updated_by));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(item_posting_group_id = %self.id, "item posting group updated");
        event_sender
            .send_or_log(Event::ItemPostingGroupUpdated(self.id))
            .await;
        Ok(updated)
    }
}
