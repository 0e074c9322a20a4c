use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
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
pub struct CreateSupplierCommand {
    pub company_id: Uuid,
    pub created_by: Uuid,
    pub form: SupplierForm,
}

#[async_trait]
impl Command for CreateSupplierCommand {
    type Result = supplier::Model;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;

        let created = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(self.company_id),
            name: Set(self.form.name.trim().to_string()),
            supplier_status: Set(self.form.supplier_status.clone()),
            tax_id: Set(self.form.tax_id.clone()),
            currency_code: Set(self.form.normalized_currency()),
            website: Set(self.form.website.clone()),
            created_by: Set(self.created_by),
            created_at: Set(Utc::now()),
            updated_by: Set(None),
            updated_at: Set(None),
        }
        .insert(db_pool.as_ref())
        .await?;

        info!(supplier_id = %created.id, "supplier created");
        event_sender
            .send_or_log(Event::SupplierCreated(created.id))
            .await;
        Ok(created)
    }
}
