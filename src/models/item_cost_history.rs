use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One posted cost observation for an item
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_cost_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub item_id: Uuid,
    pub company_id: Uuid,
    pub posting_date: NaiveDate,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item_cost::Entity",
        from = "Column::ItemId",
        to = "super::item_cost::Column::ItemId"
    )]
    ItemCost,
}

impl Related<super::item_cost::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemCost.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
