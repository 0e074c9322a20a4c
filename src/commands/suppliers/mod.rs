pub mod create_supplier_command;
pub mod update_supplier_command;

pub use create_supplier_command::CreateSupplierCommand;
pub use update_supplier_command::UpdateSupplierCommand;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SupplierForm {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub supplier_status: Option<String>,
    #[validate(length(max = 64, message = "Tax ID is too long"))]
    pub tax_id: Option<String>,
    #[validate(length(equal = 3, message = "Currency code must be 3 letters"))]
    pub currency_code: Option<String>,
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

impl SupplierForm {
    fn normalized_currency(&self) -> Option<String> {
        self.currency_code.as_ref().map(|c| c.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::Command,
        db::{establish_connection_with_config, run_migrations, DbConfig},
        events::EventSender,
    };
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn committed_create_survives_a_closed_event_channel() {
        let pool = establish_connection_with_config(&DbConfig::in_memory())
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        let (sender, rx) = EventSender::channel(1);
        drop(rx);

        let created = CreateSupplierCommand {
            company_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            form: SupplierForm {
                name: "Harbor Metals".into(),
                supplier_status: None,
                tax_id: None,
                currency_code: Some("gbp".into()),
                website: None,
            },
        }
        .execute(Arc::new(pool), Arc::new(sender))
        .await
        .unwrap();

        assert_eq!(created.currency_code.as_deref(), Some("GBP"));
    }
}
