//! Purchase order release: render, store and record the PDF, flip the status,
//! then optionally queue the supplier email.
//!
//! With [`ReleaseOrdering::StatusLast`] the status is committed only after the
//! document has been stored and recorded, so a render, upload or record
//! failure leaves the order in its editable status. If the status commit
//! itself fails, the stored object and its document row are removed again so
//! a retry starts clean. [`ReleaseOrdering::StatusFirst`] commits the status
//! up front; any later failure leaves a released order without its document
//! and is reported with `released = true`. The email step never rolls back.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    commands::{purchaseorders::ReleasePurchaseOrderCommand, Command},
    db::DbPool,
    documents::{
        interaction_path, release_file_name, DocumentRenderer, PurchaseOrderSnapshot,
        RenderedDocument, PDF_CONTENT_TYPE, PURCHASE_ORDER_SOURCE,
    },
    email::templates::{Person, PurchaseOrderEmail},
    errors::{FieldErrors, RequiredStep, ServiceError, StepContext, StepError},
    events::{Event, EventSender},
    metrics::{RELEASE_ATTEMPTS, RELEASE_STEP_FAILURES},
    models::{
        company, document, purchase_order, purchase_order_delivery, purchase_order_line,
        supplier, supplier_contact, user, AccessGroups, PurchaseOrderStatus,
    },
    storage::{ObjectStorage, UploadOptions},
    tasks::{AttachmentPayload, SendEmailPayload, TaskQueue},
};

pub const NOT_AUTHORIZED: &str = "You are not authorized to release this purchase order";
pub const RELEASED: &str = "Purchase order released";
pub const INVALID_NOTIFICATION: &str = "Invalid notification type";
pub const SUPPLIER_CONTACT_REQUIRED: &str = "Supplier contact is required";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ReleaseOrdering {
    #[default]
    StatusLast,
    StatusFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
pub enum NotificationMode {
    Email,
    None,
}

/// Submitted release form. Values stay raw until [`ReleaseForm::parse`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReleaseForm {
    #[serde(default)]
    pub notification: Option<String>,
    #[serde(default)]
    pub supplier_contact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub notification: Option<NotificationMode>,
    pub supplier_contact_id: Option<Uuid>,
}

impl ReleaseForm {
    pub fn parse(&self) -> Result<ReleaseOptions, FieldErrors> {
        let notification = match self.notification.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NotificationMode::from_str(raw)
                    .map_err(|_| FieldErrors::single("notification", INVALID_NOTIFICATION))?,
            ),
        };
        let supplier_contact_id = match self.supplier_contact.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
                FieldErrors::single("supplier_contact", "Invalid supplier contact")
            })?),
        };
        Ok(ReleaseOptions {
            notification,
            supplier_contact_id,
        })
    }
}

/// Steps that can fail independently, each with its own message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseStep {
    MarkReleased,
    Reload,
    Render,
    Upload,
    RecordDocument,
    Notify,
}

impl ReleaseStep {
    pub fn message(self) -> &'static str {
        match self {
            Self::MarkReleased => "Failed to release purchase order",
            Self::Reload => "Failed to get purchase order",
            Self::Render => "Failed to generate PDF",
            Self::Upload => "Failed to upload file",
            Self::RecordDocument => "Failed to create document",
            Self::Notify => "Failed to send email",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::MarkReleased => "mark_released",
            Self::Reload => "reload",
            Self::Render => "render",
            Self::Upload => "upload",
            Self::RecordDocument => "record_document",
            Self::Notify => "notify",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("{}", NOT_AUTHORIZED)]
    NotAuthorized,
    #[error("{0}")]
    NotReleasable(String),
    #[error("{error}")]
    Step {
        step: ReleaseStep,
        error: StepError,
        /// The status had already been committed when the step failed
        released: bool,
    },
}

impl ReleaseError {
    fn step(step: ReleaseStep, error: StepError, released: bool) -> Self {
        RELEASE_STEP_FAILURES
            .with_label_values(&[step.label()])
            .inc();
        ReleaseError::Step {
            step,
            error,
            released,
        }
    }

    pub fn released(&self) -> bool {
        matches!(self, ReleaseError::Step { released: true, .. })
    }
}

#[derive(Debug)]
pub enum NotificationOutcome {
    NotRequested,
    Enqueued { task_id: Uuid },
    Failed(StepError),
}

#[derive(Debug)]
pub struct ReleaseOutcome {
    pub purchase_order: purchase_order::Model,
    pub document: document::Model,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub purchase_order_id: Uuid,
    pub options: ReleaseOptions,
    pub locale: String,
}

#[derive(Debug, Clone)]
pub struct ReleaseSettings {
    pub ordering: ReleaseOrdering,
    pub bucket: String,
    pub cache_control_secs: u64,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            ordering: ReleaseOrdering::default(),
            bucket: "private".to_string(),
            cache_control_secs: 12 * 60 * 60,
        }
    }
}

impl From<&crate::config::AppConfig> for ReleaseSettings {
    fn from(cfg: &crate::config::AppConfig) -> Self {
        Self {
            ordering: ReleaseOrdering::from_str(&cfg.release.ordering).unwrap_or_default(),
            bucket: cfg.storage.bucket.clone(),
            cache_control_secs: cfg.storage.cache_control_secs,
        }
    }
}

struct StoredDocument {
    rendered: RenderedDocument,
    file_name: String,
    row: document::Model,
}

#[derive(Clone)]
pub struct ReleaseService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    renderer: Arc<dyn DocumentRenderer>,
    storage: Arc<dyn ObjectStorage>,
    tasks: TaskQueue,
    settings: ReleaseSettings,
    logger: Logger,
}

impl ReleaseService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        renderer: Arc<dyn DocumentRenderer>,
        storage: Arc<dyn ObjectStorage>,
        tasks: TaskQueue,
        settings: ReleaseSettings,
        logger: Logger,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            renderer,
            storage,
            tasks,
            settings,
            logger,
        }
    }

    pub fn ordering(&self) -> ReleaseOrdering {
        self.settings.ordering
    }

    #[instrument(skip(self, user), fields(purchase_order_id = %request.purchase_order_id, ordering = %self.settings.ordering))]
    pub async fn release(
        &self,
        user: &AuthUser,
        request: ReleaseRequest,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        RELEASE_ATTEMPTS.inc();
        let id = request.purchase_order_id;

        // ownership and status are checked before anything is written
        let current = purchase_order::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .required(ReleaseStep::Reload.message())
            .map_err(|e| ReleaseError::step(ReleaseStep::Reload, e, false))?;
        if !user.belongs_to_company(current.company_id) {
            warn!(%id, "release attempted on another company's purchase order");
            return Err(ReleaseError::NotAuthorized);
        }
        if !current.status.can_release() {
            return Err(ReleaseError::NotReleasable(format!(
                "Purchase order cannot be released from {}",
                current.status
            )));
        }

        let (released, stored) = match self.settings.ordering {
            ReleaseOrdering::StatusLast => {
                let mut preview = current;
                preview.status = PurchaseOrderStatus::Released;
                let stored = self
                    .store_document(user, &preview, &request.locale)
                    .await
                    .map_err(|(step, e)| ReleaseError::step(step, e, false))?;
                let released = match self.commit_status(user, id).await {
                    Ok(released) => released,
                    Err(e) => {
                        if !e.released() {
                            self.discard_document(&stored).await;
                        }
                        return Err(e);
                    }
                };
                (released, stored)
            }
            ReleaseOrdering::StatusFirst => {
                let released = self.commit_status(user, id).await?;
                let stored = self
                    .store_document(user, &released, &request.locale)
                    .await
                    .map_err(|(step, e)| ReleaseError::step(step, e, true))?;
                (released, stored)
            }
        };

        info!(%id, path = %stored.row.path, "purchase order released");
        slog::info!(self.logger, "purchase order released";
            "purchase_order_id" => %id, "user_id" => %user.user_id, "document" => &stored.row.path);
        self.event_sender
            .send_or_log(Event::PurchaseOrderReleased {
                purchase_order_id: id,
                company_id: user.company_id,
                released_by: user.user_id,
                document_path: Some(stored.row.path.clone()),
            })
            .await;

        let notification = match request.options.notification {
            None | Some(NotificationMode::None) => NotificationOutcome::NotRequested,
            Some(NotificationMode::Email) => match self
                .notify(user, &released, request.options.supplier_contact_id, &request.locale, &stored)
                .await
            {
                Ok(task_id) => {
                    self.event_sender
                        .send_or_log(Event::PurchaseOrderEmailQueued {
                            purchase_order_id: id,
                            task_id,
                        })
                        .await;
                    NotificationOutcome::Enqueued { task_id }
                }
                Err(e) => {
                    warn!(%id, error = %e, cause = %e.source, "release email not queued");
                    RELEASE_STEP_FAILURES
                        .with_label_values(&[ReleaseStep::Notify.label()])
                        .inc();
                    NotificationOutcome::Failed(e)
                }
            },
        };

        Ok(ReleaseOutcome {
            purchase_order: released,
            document: stored.row,
            notification,
        })
    }

    /// Steps 1 to 3: flip the status, reload and re-check ownership
    async fn commit_status(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<purchase_order::Model, ReleaseError> {
        ReleasePurchaseOrderCommand {
            id,
            company_id: user.company_id,
            released_by: user.user_id,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
        .step(ReleaseStep::MarkReleased.message())
        .map_err(|e| ReleaseError::step(ReleaseStep::MarkReleased, e, false))?;

        let reloaded = purchase_order::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .required(ReleaseStep::Reload.message())
            .map_err(|e| ReleaseError::step(ReleaseStep::Reload, e, true))?;
        if !user.belongs_to_company(reloaded.company_id) {
            return Err(ReleaseError::NotAuthorized);
        }
        Ok(reloaded)
    }

    /// Steps 4 to 6: render, upload and record the PDF
    async fn store_document(
        &self,
        user: &AuthUser,
        order: &purchase_order::Model,
        locale: &str,
    ) -> Result<StoredDocument, (ReleaseStep, StepError)> {
        let render_failed = ReleaseStep::Render.message();
        let snapshot = self
            .snapshot(order, locale)
            .await
            .map_err(|e| (ReleaseStep::Render, StepError::new(render_failed, e)))?;
        let rendered = self
            .renderer
            .render_purchase_order(&snapshot)
            .await
            .and_then(RenderedDocument::ensure_pdf)
            .step(render_failed)
            .map_err(|e| (ReleaseStep::Render, e))?;

        let file_name = release_file_name(&order.purchase_order_id, Utc::now());
        let path = interaction_path(user.company_id, order.supplier_interaction_id, &file_name);
        let options =
            UploadOptions::new(PDF_CONTENT_TYPE, self.settings.cache_control_secs).upsert();
        self.storage
            .upload(&self.settings.bucket, &path, rendered.bytes.clone(), &options)
            .await
            .step(ReleaseStep::Upload.message())
            .map_err(|e| (ReleaseStep::Upload, e))?;

        let row = self
            .upsert_document(user, order, &path, &file_name, rendered.size_kib())
            .await
            .step(ReleaseStep::RecordDocument.message())
            .map_err(|e| (ReleaseStep::RecordDocument, e))?;

        Ok(StoredDocument {
            rendered,
            file_name,
            row,
        })
    }

    /// Undoes `store_document` for an order whose status never changed
    async fn discard_document(&self, stored: &StoredDocument) {
        let path = &stored.row.path;
        if let Err(e) = document::Entity::delete_by_id(stored.row.id)
            .exec(self.db_pool.as_ref())
            .await
        {
            warn!(%path, error = %e, "could not remove document row of unreleased order");
        }
        if let Err(e) = self.storage.remove(&self.settings.bucket, path).await {
            warn!(%path, error = %e, "could not remove stored PDF of unreleased order");
        }
        slog::warn!(self.logger, "release document discarded"; "path" => path);
    }

    async fn snapshot(
        &self,
        order: &purchase_order::Model,
        locale: &str,
    ) -> Result<PurchaseOrderSnapshot, ServiceError> {
        let db = self.db_pool.as_ref();
        let (lines, company, supplier, delivery) = tokio::try_join!(
            purchase_order_line::Entity::find()
                .filter(purchase_order_line::Column::PurchaseOrderId.eq(order.id))
                .all(db),
            company::Entity::find_by_id(order.company_id).one(db),
            supplier::Entity::find_by_id(order.supplier_id).one(db),
            purchase_order_delivery::Entity::find_by_id(order.id).one(db),
        )?;
        let company = company.ok_or_else(|| ServiceError::not_found("company", order.company_id))?;

        Ok(PurchaseOrderSnapshot {
            purchase_order: order.clone(),
            lines,
            company,
            supplier,
            delivery,
            locale: locale.to_string(),
        })
    }

    async fn upsert_document(
        &self,
        user: &AuthUser,
        order: &purchase_order::Model,
        path: &str,
        file_name: &str,
        size: i64,
    ) -> Result<document::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = document::Entity::find()
            .filter(document::Column::Path.eq(path))
            .one(db)
            .await?;

        let saved = match existing {
            Some(existing) => {
                let mut active: document::ActiveModel = existing.into();
                active.name = Set(file_name.to_string());
                active.size = Set(size);
                active.updated_at = Set(Some(Utc::now()));
                active.update(db).await?
            }
            None => {
                document::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    path: Set(path.to_string()),
                    name: Set(file_name.to_string()),
                    size: Set(size),
                    source_document: Set(Some(PURCHASE_ORDER_SOURCE.to_string())),
                    source_document_id: Set(Some(order.id.to_string())),
                    read_groups: Set(AccessGroups::single(user.user_id)),
                    write_groups: Set(AccessGroups::single(user.user_id)),
                    company_id: Set(user.company_id),
                    created_by: Set(user.user_id),
                    created_at: Set(Utc::now()),
                    updated_at: Set(None),
                }
                .insert(db)
                .await?
            }
        };
        Ok(saved)
    }

    /// Step 7: build the supplier email and queue it with the PDF attached
    async fn notify(
        &self,
        user: &AuthUser,
        order: &purchase_order::Model,
        supplier_contact_id: Option<Uuid>,
        locale: &str,
        stored: &StoredDocument,
    ) -> Result<Uuid, StepError> {
        let contact_id =
            supplier_contact_id.ok_or_else(|| StepError::missing(SUPPLIER_CONTACT_REQUIRED))?;
        let db = self.db_pool.as_ref();
        let company_id = user.company_id;

        let (company, contact, order, lines, delivery, buyer) = tokio::try_join!(
            async {
                company::Entity::find_by_id(company_id)
                    .one(db)
                    .await
                    .required("Failed to get company")
            },
            async {
                supplier_contact::Entity::find_by_id(contact_id)
                    .filter(supplier_contact::Column::CompanyId.eq(company_id))
                    .one(db)
                    .await
                    .required("Failed to get supplier contact")
            },
            async {
                purchase_order::Entity::find_by_id(order.id)
                    .filter(purchase_order::Column::CompanyId.eq(company_id))
                    .one(db)
                    .await
                    .required(ReleaseStep::Reload.message())
            },
            async {
                purchase_order_line::Entity::find()
                    .filter(purchase_order_line::Column::PurchaseOrderId.eq(order.id))
                    .all(db)
                    .await
                    .step("Failed to get purchase order lines")
            },
            async {
                purchase_order_delivery::Entity::find_by_id(order.id)
                    .one(db)
                    .await
                    .step("Failed to get purchase order locations")
            },
            async {
                user::Entity::find_by_id(user.user_id)
                    .one(db)
                    .await
                    .required("Failed to get user")
            },
        )?;

        let email = PurchaseOrderEmail {
            company: &company,
            locale,
            purchase_order: &order,
            lines: &lines,
            delivery: delivery.as_ref(),
            recipient: Person {
                email: &contact.email,
                name: contact.full_name.as_deref(),
            },
            sender: Person {
                email: &buyer.email,
                name: buyer.full_name.as_deref(),
            },
        };
        let rendered = email.render();

        let payload = SendEmailPayload {
            to: vec![buyer.email.clone(), contact.email.clone()],
            from: buyer.email.clone(),
            subject: email.subject(),
            html: rendered.html,
            text: Some(rendered.text),
            attachments: vec![AttachmentPayload::encode(
                stored.file_name.clone(),
                &stored.rendered.bytes,
            )],
            company_id,
        };
        self.tasks
            .send_email(&payload)
            .await
            .step(ReleaseStep::Notify.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("None"), Some(NotificationMode::None))]
    #[case(Some("Email"), Some(NotificationMode::Email))]
    fn notification_modes(#[case] raw: Option<&str>, #[case] expected: Option<NotificationMode>) {
        let form = ReleaseForm {
            notification: raw.map(str::to_string),
            supplier_contact: None,
        };
        assert_eq!(form.parse().unwrap().notification, expected);
    }

    #[test]
    fn unknown_notification_is_a_field_error() {
        let form = ReleaseForm {
            notification: Some("Fax".into()),
            supplier_contact: None,
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(
            errors.get("notification"),
            Some(&[INVALID_NOTIFICATION.to_string()][..])
        );
    }

    #[test]
    fn malformed_contact_is_a_field_error() {
        let form = ReleaseForm {
            notification: Some("Email".into()),
            supplier_contact: Some("not-a-uuid".into()),
        };
        assert!(form.parse().unwrap_err().get("supplier_contact").is_some());
    }

    #[test]
    fn ordering_parses_from_config_values() {
        assert_eq!(
            ReleaseOrdering::from_str("status-first").unwrap(),
            ReleaseOrdering::StatusFirst
        );
        assert_eq!(
            ReleaseOrdering::from_str("Status-Last").unwrap(),
            ReleaseOrdering::StatusLast
        );
        assert_matches!(ReleaseOrdering::from_str("later"), Err(_));
        assert_eq!(ReleaseOrdering::StatusLast.to_string(), "status-last");
    }

    #[test]
    fn released_flag_is_reported() {
        let err = ReleaseError::step(
            ReleaseStep::Upload,
            StepError::missing(ReleaseStep::Upload.message()),
            true,
        );
        assert!(err.released());
        assert_eq!(err.to_string(), "Failed to upload file");
        assert!(!ReleaseError::NotAuthorized.released());
    }
}
