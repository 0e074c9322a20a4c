use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::SupplierForm;
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::supplier,
};

#[derive(Debug, Clone)]
pub struct UpdateSupplierCommand {
    pub id: Uuid,
    pub company_id: Uuid,
    pub updated_by: Uuid,
    pub form: SupplierForm,
}

#[async_trait]
impl Command for UpdateSupplierCommand {
    type Result = supplier::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(supplier_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;
        let db = db_pool.as_ref();

        let existing = supplier::Entity::find_by_id(self.id)
            .filter(supplier::Column::CompanyId.eq(self.company_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("supplier", self.id))?;

        let mut active: supplier::ActiveModel = existing.into();
        active.name = Set(self.form.name.trim().to_string());
        active.supplier_status = Set(self.form.supplier_status.clone());
        active.tax_id = Set(self.form.tax_id.clone());
        active.currency_code = Set(self.form.normalized_currency());
        active.website = Set(self.form.website.clone());
        active.updated_by = Set(Some(self.updated_by));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(supplier_id = %self.id, "supplier updated");
        event_sender
            .send_or_log(Event::SupplierUpdated(self.id))
            .await;
        Ok(updated)
    }
}
