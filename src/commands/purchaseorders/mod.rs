pub mod release_purchase_order_command;
pub mod update_purchase_order_delivery_command;
pub mod update_purchase_order_details_command;
pub mod update_purchase_order_payment_command;

pub use release_purchase_order_command::ReleasePurchaseOrderCommand;
pub use update_purchase_order_delivery_command::{
    PurchaseOrderDeliveryForm, UpdatePurchaseOrderDeliveryCommand,
};
pub use update_purchase_order_details_command::{
    PurchaseOrderDetailsForm, UpdatePurchaseOrderDetailsCommand,
};
pub use update_purchase_order_payment_command::{
    PurchaseOrderPaymentForm, UpdatePurchaseOrderPaymentCommand,
};

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;
use validator::ValidationError;

use crate::errors::ServiceError;
use crate::models::purchase_order;

/// Loads a purchase order only if it belongs to `company_id`
pub(crate) async fn find_purchase_order<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    company_id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(id)
        .filter(purchase_order::Column::CompanyId.eq(company_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("purchase order", id))
}

pub(crate) fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some("Must be greater than 0".into());
        Err(err)
    }
}

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Must not be negative".into());
        Err(err)
    }
}
