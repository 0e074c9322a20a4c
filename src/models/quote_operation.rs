use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill of process row of a quote line's make method
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quote_operations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub quote_make_method_id: Option<Uuid>,
    pub description: Option<String>,
    pub work_center_id: Option<Uuid>,
    pub setup_hours: Decimal,
    pub labor_rate: Option<Decimal>,
    pub machine_rate: Option<Decimal>,
    pub operation_supplier_process_id: Option<Uuid>,
    pub work_instruction: Option<Json>,
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
