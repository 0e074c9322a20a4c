use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Delivery section of a purchase order, keyed by the order id
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_deliveries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub location_id: Option<Uuid>,
    pub supplier_shipping_cost: Decimal,
    pub shipping_method_id: Option<Uuid>,
    pub shipping_term_id: Option<Uuid>,
    pub tracking_number: Option<String>,
    pub receipt_requested_date: Option<NaiveDate>,
    pub receipt_promised_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub drop_shipment: bool,
    pub customer_id: Option<Uuid>,
    pub customer_location_id: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
