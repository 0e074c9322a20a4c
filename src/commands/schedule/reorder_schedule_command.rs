use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, TransactionError,
    TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{schedule_column, schedule_item},
};

/// Drag-and-drop result: the column and every item in it, top to bottom
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScheduleReorder {
    pub column_id: Uuid,
    pub item_ids: Vec<Uuid>,
}

/// Moves the listed items into the column with `priority = index`
#[derive(Debug, Clone)]
pub struct ReorderScheduleCommand {
    pub company_id: Uuid,
    pub reorder: ScheduleReorder,
}

#[async_trait]
impl Command for ReorderScheduleCommand {
    type Result = usize;

    #[instrument(skip(self, db_pool, event_sender), fields(column_id = %self.reorder.column_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let company_id = self.company_id;
        let column_id = self.reorder.column_id;
        let item_ids = self.reorder.item_ids.clone();

        let unique: HashSet<&Uuid> = item_ids.iter().collect();
        if unique.len() != item_ids.len() {
            return Err(ServiceError::ValidationError(
                "An item can only appear once in a column".to_string(),
            ));
        }

        let moved = db_pool
            .transaction::<_, usize, ServiceError>(|txn| {
                Box::pin(async move {
                    schedule_column::Entity::find_by_id(column_id)
                        .filter(schedule_column::Column::CompanyId.eq(company_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("schedule column", column_id))?;

                    if !item_ids.is_empty() {
                        let owned = schedule_item::Entity::find()
                            .filter(schedule_item::Column::Id.is_in(item_ids.clone()))
                            .filter(schedule_item::Column::CompanyId.eq(company_id))
                            .count(txn)
                            .await?;
                        if owned as usize != item_ids.len() {
                            return Err(ServiceError::Forbidden(
                                "Schedule items must belong to your company".to_string(),
                            ));
                        }
                    }

                    for (index, id) in item_ids.iter().enumerate() {
                        schedule_item::Entity::update_many()
                            .col_expr(schedule_item::Column::ColumnId, Expr::value(column_id))
                            .col_expr(schedule_item::Column::Priority, Expr::value(index as i32))
                            .filter(schedule_item::Column::Id.eq(*id))
                            .exec(txn)
                            .await?;
                    }
                    Ok(item_ids.len())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => db_err.into(),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        event_sender
            .send_or_log(Event::ScheduleReordered {
                column_id,
                items: moved,
            })
            .await;
        info!(%column_id, items = moved, "schedule column reordered");
        Ok(moved)
    }
}
