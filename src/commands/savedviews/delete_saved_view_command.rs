use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionError,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::list_group;
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::saved_view,
};

/// Removes one of the caller's own views and closes the gap it leaves,
/// so the rest of the group stays numbered 0..k-1.
#[derive(Debug, Clone)]
pub struct DeleteSavedViewCommand {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
}

#[async_trait]
impl Command for DeleteSavedViewCommand {
    type Result = saved_view::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(saved_view_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let id = self.id;
        let user_id = self.user_id;
        let company_id = self.company_id;

        let view = db_pool
            .transaction::<_, saved_view::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let view = saved_view::Entity::find_by_id(id)
                        .filter(saved_view::Column::UserId.eq(user_id))
                        .filter(saved_view::Column::CompanyId.eq(company_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("saved view", id))?;

                    saved_view::Entity::delete_by_id(view.id).exec(txn).await?;

                    let remaining = list_group(txn, user_id, company_id, &view.group_key).await?;
                    for (index, other) in remaining.into_iter().enumerate() {
                        let position = index as i32;
                        if other.sort_order != position {
                            let mut active: saved_view::ActiveModel = other.into();
                            active.sort_order = Set(position);
                            active.update(txn).await?;
                        }
                    }
                    Ok(view)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => db_err.into(),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        event_sender
            .send_or_log(Event::SavedViewDeleted(view.id))
            .await;
        info!(saved_view_id = %view.id, "saved view deleted");
        Ok(view)
    }
}
