use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_rfq_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sales_rfq_id: Uuid,
    pub company_id: Uuid,
    pub customer_part_id: String,
    pub customer_part_revision: Option<String>,
    pub description: Option<String>,
    pub item_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_of_measure_code: String,
    pub custom_fields: Option<Json>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_rfq::Entity",
        from = "Column::SalesRfqId",
        to = "super::sales_rfq::Column::Id"
    )]
    SalesRfq,
}

impl Related<super::sales_rfq::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesRfq.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
