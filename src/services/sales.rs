//! Quote make methods and sales RFQ lines.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use serde_json::Value;
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    commands::{
        sales::{CreateSalesRfqLineCommand, SalesRfqLineForm},
        Command,
    },
    db::DbPool,
    errors::{StepContext, StepError},
    events::EventSender,
    models::{quote_material, quote_operation, sales_rfq_line},
    rich_text,
};

pub const LOAD_MATERIALS_FAILED: &str = "Failed to load quote materials";
pub const LOAD_OPERATIONS_FAILED: &str = "Failed to load quote operations";
pub const INSERT_RFQ_LINE_FAILED: &str = "Failed to insert RFQ line";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QuoteMaterialView {
    pub id: Uuid,
    pub item_readable_id: String,
    pub item_type: String,
    pub description: String,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    #[schema(value_type = String)]
    pub unit_cost: Decimal,
    pub unit_of_measure_code: String,
    pub quote_operation_id: Option<Uuid>,
}

impl From<quote_material::Model> for QuoteMaterialView {
    fn from(m: quote_material::Model) -> Self {
        Self {
            id: m.id,
            item_readable_id: m.item_readable_id,
            item_type: m.item_type,
            description: m.description,
            quantity: m.quantity,
            unit_cost: m.unit_cost,
            unit_of_measure_code: m.unit_of_measure_code.unwrap_or_default(),
            quote_operation_id: m.quote_operation_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QuoteOperationView {
    pub id: Uuid,
    pub quote_make_method_id: Uuid,
    pub description: String,
    pub work_center_id: Option<Uuid>,
    #[schema(value_type = String)]
    pub setup_hours: Decimal,
    #[schema(value_type = String)]
    pub labor_rate: Decimal,
    #[schema(value_type = String)]
    pub machine_rate: Decimal,
    pub operation_supplier_process_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub work_instruction: Value,
}

impl QuoteOperationView {
    /// Fills the blanks the editor cannot handle
    pub fn normalize(o: quote_operation::Model, method_id: Uuid) -> Self {
        Self {
            id: o.id,
            quote_make_method_id: o.quote_make_method_id.unwrap_or(method_id),
            description: o.description.unwrap_or_default(),
            work_center_id: o.work_center_id,
            setup_hours: o.setup_hours,
            labor_rate: o.labor_rate.unwrap_or(Decimal::ZERO),
            machine_rate: o.machine_rate.unwrap_or(Decimal::ZERO),
            operation_supplier_process_id: o.operation_supplier_process_id,
            work_instruction: o.work_instruction.unwrap_or_else(rich_text::empty_document),
        }
    }
}

/// Bill of material and bill of process of one make method
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuoteMakeMethod {
    pub quote_make_method_id: Uuid,
    pub materials: Vec<QuoteMaterialView>,
    pub operations: Vec<QuoteOperationView>,
}

#[derive(Clone)]
pub struct SalesService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl SalesService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Both queries run concurrently; a materials failure is reported ahead
    /// of an operations failure.
    #[instrument(skip(self, user), fields(company_id = %user.company_id))]
    pub async fn load_make_method(
        &self,
        method_id: Uuid,
        user: &AuthUser,
    ) -> Result<QuoteMakeMethod, StepError> {
        let db = self.db_pool.as_ref();
        let company_id = user.company_id;

        let materials = quote_material::Entity::find()
            .filter(quote_material::Column::QuoteMakeMethodId.eq(method_id))
            .filter(quote_material::Column::CompanyId.eq(company_id))
            .order_by_asc(quote_material::Column::SortOrder)
            .all(db);
        let operations = quote_operation::Entity::find()
            .filter(quote_operation::Column::QuoteMakeMethodId.eq(method_id))
            .filter(quote_operation::Column::CompanyId.eq(company_id))
            .order_by_asc(quote_operation::Column::SortOrder)
            .all(db);

        let (materials, operations) = tokio::join!(materials, operations);
        let materials = materials.step(LOAD_MATERIALS_FAILED)?;
        let operations = operations.step(LOAD_OPERATIONS_FAILED)?;

        Ok(QuoteMakeMethod {
            quote_make_method_id: method_id,
            materials: materials.into_iter().map(QuoteMaterialView::from).collect(),
            operations: operations
                .into_iter()
                .map(|o| QuoteOperationView::normalize(o, method_id))
                .collect(),
        })
    }

    #[instrument(skip(self, user, form), fields(company_id = %user.company_id))]
    pub async fn insert_rfq_line(
        &self,
        sales_rfq_id: Uuid,
        user: &AuthUser,
        form: SalesRfqLineForm,
    ) -> Result<sales_rfq_line::Model, StepError> {
        let line = CreateSalesRfqLineCommand {
            sales_rfq_id,
            company_id: user.company_id,
            created_by: user.user_id,
            form,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
        .step(INSERT_RFQ_LINE_FAILED)?;
        slog::info!(self.logger, "sales RFQ line inserted";
            "sales_rfq_id" => %sales_rfq_id, "line_id" => %line.id, "user_id" => %user.user_id);
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_operation_fields_get_editor_defaults() {
        let method_id = Uuid::new_v4();
        let view = QuoteOperationView::normalize(
            quote_operation::Model {
                id: Uuid::new_v4(),
                company_id: Uuid::new_v4(),
                quote_make_method_id: None,
                description: None,
                work_center_id: None,
                setup_hours: Decimal::new(15, 1),
                labor_rate: None,
                machine_rate: Some(Decimal::new(80, 0)),
                operation_supplier_process_id: None,
                work_instruction: None,
                sort_order: 0,
            },
            method_id,
        );
        assert_eq!(view.quote_make_method_id, method_id);
        assert_eq!(view.description, "");
        assert_eq!(view.labor_rate, Decimal::ZERO);
        assert_eq!(view.machine_rate, Decimal::new(80, 0));
        assert_eq!(view.work_instruction, rich_text::empty_document());
    }

    #[test]
    fn material_without_unit_gets_an_empty_code() {
        let view = QuoteMaterialView::from(quote_material::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            quote_make_method_id: Uuid::new_v4(),
            item_readable_id: "BRKT-100".into(),
            item_type: "Part".into(),
            description: "Bracket".into(),
            quantity: Decimal::new(2, 0),
            unit_cost: Decimal::new(325, 2),
            unit_of_measure_code: None,
            quote_operation_id: None,
            sort_order: 0,
        });
        assert_eq!(view.unit_of_measure_code, "");
    }
}
