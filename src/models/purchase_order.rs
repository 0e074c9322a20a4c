use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PurchaseOrderStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "To Review")]
    #[serde(rename = "To Review")]
    ToReview,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Released")]
    Released,
    #[sea_orm(string_value = "To Receive")]
    #[serde(rename = "To Receive")]
    ToReceive,
    #[sea_orm(string_value = "To Invoice")]
    #[serde(rename = "To Invoice")]
    ToInvoice,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Closed")]
    Closed,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::ToReview => "To Review",
            Self::Rejected => "Rejected",
            Self::Released => "Released",
            Self::ToReceive => "To Receive",
            Self::ToInvoice => "To Invoice",
            Self::Completed => "Completed",
            Self::Closed => "Closed",
        }
    }

    /// Draft and To Review orders can still have their sections edited
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::ToReview)
    }

    pub fn can_release(&self) -> bool {
        self.is_editable()
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human readable number, e.g. PO000123
    pub purchase_order_id: String,
    pub company_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_interaction_id: Uuid,
    pub supplier_contact_id: Option<Uuid>,
    pub supplier_reference: Option<String>,
    pub status: PurchaseOrderStatus,
    pub order_date: NaiveDate,
    pub currency_code: String,
    pub exchange_rate: Decimal,
    pub internal_notes: Option<Json>,
    pub external_notes: Option<Json>,
    pub custom_fields: Option<Json>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub released_by: Option<Uuid>,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::purchase_order_line::Entity")]
    Lines,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::purchase_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
