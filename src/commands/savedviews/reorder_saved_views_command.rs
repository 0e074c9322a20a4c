use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, Set, TransactionError, TransactionTrait};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{check_permutation, list_group};
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::saved_view,
};

/// Writes `sort_order = index` for the submitted order of a group.
///
/// The submitted list must be a permutation of the group's current views.
#[derive(Debug, Clone)]
pub struct ReorderSavedViewsCommand {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub group_key: String,
    pub view_ids: Vec<Uuid>,
}

#[async_trait]
impl Command for ReorderSavedViewsCommand {
    type Result = Vec<saved_view::Model>;

    #[instrument(skip(self, db_pool, event_sender), fields(group = %self.group_key, views = self.view_ids.len()))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let user_id = self.user_id;
        let company_id = self.company_id;
        let group_key = self.group_key.clone();
        let view_ids = self.view_ids.clone();

        let reordered = db_pool
            .transaction::<_, Vec<saved_view::Model>, ServiceError>(|txn| {
                Box::pin(async move {
                    let current = list_group(txn, user_id, company_id, &group_key).await?;
                    check_permutation(&current, &view_ids)?;
                    let mut by_id: HashMap<Uuid, saved_view::Model> =
                        current.into_iter().map(|v| (v.id, v)).collect();

                    let mut saved = Vec::with_capacity(view_ids.len());
                    for (index, id) in view_ids.iter().enumerate() {
                        let view = by_id.remove(id).ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Saved view {} is not in this group",
                                id
                            ))
                        })?;
                        let position = index as i32;
                        if view.sort_order == position {
                            saved.push(view);
                            continue;
                        }
                        let mut active: saved_view::ActiveModel = view.into();
                        active.sort_order = Set(position);
                        saved.push(active.update(txn).await?);
                    }
                    Ok(saved)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => db_err.into(),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        event_sender
            .send_or_log(Event::SavedViewsReordered {
                user_id,
                group_key: self.group_key.clone(),
            })
            .await;
        info!(%user_id, group = %self.group_key, "saved views reordered");
        Ok(reordered)
    }
}
