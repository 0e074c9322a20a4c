use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub column_id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub priority: i32,
    /// Planned duration in milliseconds
    pub duration_ms: Option<i64>,
    /// Time already recorded against the item, in milliseconds
    pub progress_ms: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schedule_column::Entity",
        from = "Column::ColumnId",
        to = "super::schedule_column::Column::Id"
    )]
    ScheduleColumn,
}

impl Related<super::schedule_column::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleColumn.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
