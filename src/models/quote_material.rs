use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill of material row of a quote line's make method
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quote_materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub quote_make_method_id: Uuid,
    pub item_readable_id: String,
    pub item_type: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub unit_of_measure_code: Option<String>,
    pub quote_operation_id: Option<Uuid>,
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
