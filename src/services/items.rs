//! Item posting groups and consumable costing.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use slog::Logger;
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    commands::{
        items::{
            ItemCostForm, ItemPostingGroupForm, UpdateItemCostCommand,
            UpdateItemPostingGroupCommand,
        },
        Command,
    },
    db::DbPool,
    errors::{RequiredStep, StepContext, StepError},
    events::EventSender,
    models::{item_cost, item_cost_history, item_posting_group},
};

pub const UPDATED_GROUP: &str = "Updated item group";
pub const UPDATE_GROUP_FAILED: &str = "Failed to update item group";
pub const LOAD_COSTING_FAILED: &str = "Failed to load consumable costing";
pub const UPDATED_COSTING: &str = "Updated consumable costing";
pub const UPDATE_COSTING_FAILED: &str = "Failed to update consumable costing";

/// Costing page: the current cost plus its posted history, oldest first
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsumableCosting {
    #[schema(value_type = Object)]
    pub item_cost: item_cost::Model,
    #[schema(value_type = Vec<Object>)]
    pub item_cost_history: Vec<item_cost_history::Model>,
}

#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// A missing or unreadable group renders as an empty form
    #[instrument(skip(self, user), fields(company_id = %user.company_id))]
    pub async fn load_posting_group(
        &self,
        id: Uuid,
        user: &AuthUser,
    ) -> Option<item_posting_group::Model> {
        let found = item_posting_group::Entity::find_by_id(id)
            .filter(item_posting_group::Column::CompanyId.eq(user.company_id))
            .one(self.db_pool.as_ref())
            .await;
        match found {
            Ok(group) => group,
            Err(e) => {
                warn!(error = %e, %id, "could not read item posting group");
                None
            }
        }
    }

    #[instrument(skip(self, user, form))]
    pub async fn update_posting_group(
        &self,
        id: Uuid,
        user: &AuthUser,
        form: ItemPostingGroupForm,
    ) -> Result<item_posting_group::Model, StepError> {
        let updated = UpdateItemPostingGroupCommand {
            id,
            company_id: user.company_id,
            updated_by: user.user_id,
            form,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
        .step(UPDATE_GROUP_FAILED)?;
        slog::info!(self.logger, "item posting group updated";
            "item_posting_group_id" => %id, "user_id" => %user.user_id);
        Ok(updated)
    }

    /// Reads the cost and its history concurrently. Only the cost is
    /// required; an unreadable history shows as empty.
    #[instrument(skip(self, user), fields(company_id = %user.company_id))]
    pub async fn load_costing(
        &self,
        item_id: Uuid,
        user: &AuthUser,
    ) -> Result<ConsumableCosting, StepError> {
        let db = self.db_pool.as_ref();
        let company_id = user.company_id;

        let cost = item_cost::Entity::find_by_id(item_id)
            .filter(item_cost::Column::CompanyId.eq(company_id))
            .one(db);
        let history = item_cost_history::Entity::find()
            .filter(item_cost_history::Column::ItemId.eq(item_id))
            .filter(item_cost_history::Column::CompanyId.eq(company_id))
            .order_by_asc(item_cost_history::Column::PostingDate)
            .all(db);

        let (cost, history) = tokio::join!(cost, history);
        let item_cost = cost.required(LOAD_COSTING_FAILED)?;
        let item_cost_history = history.unwrap_or_else(|e| {
            warn!(error = %e, %item_id, "item cost history unavailable");
            Vec::new()
        });

        Ok(ConsumableCosting {
            item_cost,
            item_cost_history,
        })
    }

    #[instrument(skip(self, user, form))]
    pub async fn update_costing(
        &self,
        item_id: Uuid,
        user: &AuthUser,
        form: ItemCostForm,
    ) -> Result<item_cost::Model, StepError> {
        let updated = UpdateItemCostCommand {
            item_id,
            company_id: user.company_id,
            updated_by: user.user_id,
            form,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
        .step(UPDATE_COSTING_FAILED)?;
        slog::info!(self.logger, "item cost updated"; "item_id" => %item_id, "user_id" => %user.user_id);
        Ok(updated)
    }
}
