use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CostingMethod {
    #[sea_orm(string_value = "Standard")]
    Standard,
    #[sea_orm(string_value = "Average")]
    Average,
    #[sea_orm(string_value = "FIFO")]
    #[serde(rename = "FIFO")]
    Fifo,
    #[sea_orm(string_value = "LIFO")]
    #[serde(rename = "LIFO")]
    Lifo,
}

/// Costing of one item; the row is keyed by the item it prices
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_costs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: Uuid,
    pub company_id: Uuid,
    pub readable_id: String,
    pub costing_method: CostingMethod,
    pub standard_cost: Decimal,
    pub unit_cost: Decimal,
    pub cost_is_adjusted: bool,
    pub item_posting_group_id: Option<Uuid>,
    pub custom_fields: Option<Json>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item_cost_history::Entity")]
    History,
}

impl Related<super::item_cost_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
