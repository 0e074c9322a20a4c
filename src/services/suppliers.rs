use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{Action, AuthUser, Module},
    commands::{
        suppliers::{CreateSupplierCommand, SupplierForm, UpdateSupplierCommand},
        Command,
    },
    db::DbPool,
    errors::{ServiceError, StepContext, StepError},
    events::EventSender,
    models::supplier,
};

pub const CREATED: &str = "Created supplier";
pub const UPDATED: &str = "Updated supplier";
pub const CREATE_FAILED: &str = "Failed to create supplier";
pub const UPDATE_FAILED: &str = "Failed to update supplier";

#[derive(Debug, Clone)]
pub struct SupplierUpsert {
    pub supplier: supplier::Model,
    pub created: bool,
}

impl SupplierUpsert {
    pub fn message(&self) -> &'static str {
        if self.created {
            CREATED
        } else {
            UPDATED
        }
    }
}

/// Capability needed to submit the supplier form with or without an id
pub fn required_action(id: Option<Uuid>) -> Action {
    match id {
        Some(_) => Action::Update,
        None => Action::Create,
    }
}

#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Inserts when `id` is absent, otherwise updates the company's row
    #[instrument(skip(self, user, form), fields(company_id = %user.company_id))]
    pub async fn upsert(
        &self,
        user: &AuthUser,
        id: Option<Uuid>,
        form: SupplierForm,
    ) -> Result<SupplierUpsert, StepError> {
        let failed = match id {
            Some(_) => UPDATE_FAILED,
            None => CREATE_FAILED,
        };
        let action = required_action(id);
        if !user.can(action, Module::Purchasing) {
            return Err(StepError::new(
                failed,
                ServiceError::Forbidden(format!("{}_purchasing is required", action)),
            ));
        }

        let result = match id {
            None => CreateSupplierCommand {
                company_id: user.company_id,
                created_by: user.user_id,
                form,
            }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
            .map(|supplier| SupplierUpsert {
                supplier,
                created: true,
            }),
            Some(id) => UpdateSupplierCommand {
                id,
                company_id: user.company_id,
                updated_by: user.user_id,
                form,
            }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
            .map(|supplier| SupplierUpsert {
                supplier,
                created: false,
            }),
        };

        let upsert = result.step(failed)?;
        slog::info!(self.logger, "supplier saved";
            "supplier_id" => %upsert.supplier.id, "created" => upsert.created, "user_id" => %user.user_id);
        Ok(upsert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_needs_update_capability() {
        assert_eq!(required_action(None), Action::Create);
        assert_eq!(required_action(Some(Uuid::new_v4())), Action::Update);
    }
}
