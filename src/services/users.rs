//! `user-admin` task: deactivation and invite resends.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use slog::Logger;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    common::nanoid,
    db::DbPool,
    email::{
        templates::{InviteEmail, Person},
        EmailMessage, EmailSender,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{company, invite, user},
    tasks::{TaskHandler, TaskResult, UserAdminPayload},
};

pub const LOAD_COMPANY_OR_USER_FAILED: &str = "Failed to load company or user";
pub const LOAD_INVITE_FAILED: &str = "Failed to load existing invite";

pub fn invite_link(app_url: &str, code: &str) -> String {
    format!("{}/invite/{}", app_url.trim_end_matches('/'), code)
}

pub struct UserAdminHandler {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    email: Arc<dyn EmailSender>,
    app_url: String,
    from: String,
    logger: Logger,
}

impl UserAdminHandler {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        email: Arc<dyn EmailSender>,
        app_url: impl Into<String>,
        from: impl Into<String>,
        logger: Logger,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            email,
            app_url: app_url.into(),
            from: from.into(),
            logger,
        }
    }

    #[instrument(skip(self))]
    async fn deactivate(&self, id: Uuid, company_id: Uuid) -> Result<TaskResult, ServiceError> {
        let db = self.db_pool.as_ref();
        let Some(found) = user::Entity::find_by_id(id)
            .filter(user::Column::CompanyId.eq(company_id))
            .one(db)
            .await?
        else {
            return Ok(TaskResult::failed(format!("User {} not found", id)));
        };

        let mut active: user::ActiveModel = found.into();
        active.active = Set(false);
        active.deactivated_at = Set(Some(Utc::now()));
        active.update(db).await?;

        self.event_sender
            .send_or_log(Event::UserDeactivated(id))
            .await;
        slog::info!(self.logger, "user deactivated"; "user_id" => %id, "company_id" => %company_id);
        Ok(TaskResult::ok(format!("Successfully deactivated {}", id)))
    }

    #[instrument(skip(self, location, ip))]
    async fn resend(
        &self,
        id: Uuid,
        company_id: Uuid,
        location: &str,
        ip: &str,
    ) -> Result<TaskResult, ServiceError> {
        let db = self.db_pool.as_ref();
        let (company, invited) = tokio::try_join!(
            company::Entity::find_by_id(company_id).one(db),
            user::Entity::find_by_id(id).one(db),
        )
        .map_err(|e| {
            warn!(error = %e, "resend lookup failed");
            ServiceError::NotFound(LOAD_COMPANY_OR_USER_FAILED.to_string())
        })?;
        let (Some(company), Some(invited)) = (company, invited) else {
            return Err(ServiceError::NotFound(
                LOAD_COMPANY_OR_USER_FAILED.to_string(),
            ));
        };

        let pending = invite::Entity::find()
            .filter(invite::Column::Email.eq(invited.email.clone()))
            .filter(invite::Column::CompanyId.eq(company_id))
            .filter(invite::Column::AcceptedAt.is_null())
            .order_by_desc(invite::Column::CreatedAt)
            .one(db)
            .await;
        let pending = match pending {
            Ok(Some(found)) => found,
            Ok(None) => return Ok(TaskResult::failed(LOAD_INVITE_FAILED)),
            Err(e) => {
                warn!(error = %e, "invite lookup failed");
                return Ok(TaskResult::failed(LOAD_INVITE_FAILED));
            }
        };

        let link = invite_link(&self.app_url, &pending.code);
        let email = InviteEmail {
            invited_by: Person {
                email: &invited.email,
                name: invited.full_name.as_deref(),
            },
            email: &invited.email,
            company_name: &company.name,
            invite_link: &link,
            ip,
            location,
        };
        let rendered = email.render();
        self.email
            .send(EmailMessage {
                to: vec![invited.email.clone()],
                from: self.from.clone(),
                subject: email.subject(),
                html: rendered.html,
                text: Some(rendered.text),
                attachments: Vec::new(),
                entity_ref_id: Some(nanoid()),
            })
            .await?;

        self.event_sender
            .send_or_log(Event::InviteResent {
                user_id: id,
                invite_id: pending.id,
            })
            .await;
        slog::info!(self.logger, "invite resent"; "user_id" => %id, "invite_id" => %pending.id);
        Ok(TaskResult::ok(format!("Successfully resent invite for {}", id)))
    }
}

#[async_trait]
impl TaskHandler for UserAdminHandler {
    async fn handle(&self, payload: serde_json::Value) -> Result<TaskResult, ServiceError> {
        let payload: UserAdminPayload = serde_json::from_value(payload)?;
        let result = match &payload {
            UserAdminPayload::Deactivate { id, company_id } => {
                self.deactivate(*id, *company_id).await?
            }
            UserAdminPayload::Resend {
                id,
                location,
                ip,
                company_id,
            } => self.resend(*id, *company_id, location, ip).await?,
        };
        if result.success {
            info!(message = %result.message, "user admin task succeeded");
        } else {
            warn!(message = %result.message, "user admin task failed");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_joins_without_double_slash() {
        assert_eq!(
            invite_link("https://app.example/", "abc123"),
            "https://app.example/invite/abc123"
        );
        assert_eq!(
            invite_link("http://localhost:3000", "x"),
            "http://localhost:3000/invite/x"
        );
    }
}
