//! Database entities for the purchasing, items, sales, scheduling and people
//! workflows.

pub mod company;
pub mod document;
pub mod invite;
pub mod item_cost;
pub mod item_cost_history;
pub mod item_posting_group;
pub mod purchase_invoice;
pub mod purchase_invoice_line;
pub mod purchase_order;
pub mod purchase_order_delivery;
pub mod purchase_order_line;
pub mod purchase_order_payment;
pub mod quote_material;
pub mod quote_operation;
pub mod receipt;
pub mod sales_rfq;
pub mod sales_rfq_line;
pub mod saved_view;
pub mod schedule_column;
pub mod schedule_item;
pub mod supplier;
pub mod supplier_contact;
pub mod supplier_interaction;
pub mod supplier_quote;
pub mod supplier_quote_line;
pub mod user;

pub use item_cost::CostingMethod;
pub use purchase_order::PurchaseOrderStatus;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User ids allowed to read or write a stored document
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct AccessGroups(pub Vec<Uuid>);

impl AccessGroups {
    pub fn single(user_id: Uuid) -> Self {
        Self(vec![user_id])
    }

    pub fn contains(&self, user_id: &Uuid) -> bool {
        self.0.contains(user_id)
    }
}
