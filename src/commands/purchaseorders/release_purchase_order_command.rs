use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionError, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::find_purchase_order;
use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{purchase_order, PurchaseOrderStatus},
};

/// Flips the status to Released. The release pipeline publishes the event
/// once the whole chain has run.
#[derive(Debug, Clone)]
pub struct ReleasePurchaseOrderCommand {
    pub id: Uuid,
    pub company_id: Uuid,
    pub released_by: Uuid,
}

#[async_trait]
impl Command for ReleasePurchaseOrderCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, _event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        _event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let id = self.id;
        let company_id = self.company_id;
        let released_by = self.released_by;

        let released = db_pool
            .transaction::<_, purchase_order::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let order = find_purchase_order(txn, id, company_id).await?;
                    if !order.status.can_release() {
                        return Err(ServiceError::InvalidStatus(format!(
                            "Purchase order cannot be released from {}",
                            order.status
                        )));
                    }

                    let now = Utc::now();
                    let mut active: purchase_order::ActiveModel = order.into();
                    active.status = Set(PurchaseOrderStatus::Released);
                    active.released_by = Set(Some(released_by));
                    active.released_at = Set(Some(now));
                    active.updated_by = Set(Some(released_by));
                    active.updated_at = Set(Some(now));
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => db_err.into(),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(purchase_order_id = %id, "purchase order status set to Released");
        Ok(released)
    }
}
