use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionError, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{list_group, next_position};
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::saved_view,
};

fn validate_site_path(path: &str) -> Result<(), validator::ValidationError> {
    if path.starts_with('/') && !path.starts_with("//") {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("site_path");
        error.message = Some("Path must start with /".into());
        Err(error)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SavedViewForm {
    #[validate(length(min = 1, max = 64, message = "Group is required"))]
    pub group_key: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(custom = "validate_site_path")]
    pub path: String,
}

/// Appends a view at the end of its group
#[derive(Debug, Clone)]
pub struct CreateSavedViewCommand {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub form: SavedViewForm,
}

#[async_trait]
impl Command for CreateSavedViewCommand {
    type Result = saved_view::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(group = %self.form.group_key))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.form.validate()?;

        let user_id = self.user_id;
        let company_id = self.company_id;
        let form = self.form.clone();

        let created = db_pool
            .transaction::<_, saved_view::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let existing = list_group(txn, user_id, company_id, &form.group_key).await?;
                    let view = saved_view::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        user_id: Set(user_id),
                        company_id: Set(company_id),
                        group_key: Set(form.group_key),
                        name: Set(form.name.trim().to_string()),
                        path: Set(form.path),
                        sort_order: Set(next_position(&existing)),
                        created_at: Set(Utc::now()),
                    };
                    Ok(view.insert(txn).await?)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => db_err.into(),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        event_sender
            .send_or_log(Event::SavedViewCreated(created.id))
            .await;
        Ok(created)
    }
}
