//! Internal and external rich-text notes on purchasing records.
//!
//! Edits go through a [`PendingWrites`] slot keyed by record and scope, so a
//! burst of keystrokes inside the quiet period becomes one row update.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sea_orm::{sea_query::Expr, ColumnTrait, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slog::Logger;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{Action, AuthUser, Module},
    common::nanoid,
    db::DbPool,
    debounce::{PendingWrites, WriteSink},
    documents::interaction_path,
    errors::{ServiceError, StepContext, StepError},
    events::{Event, EventSender},
    metrics::NOTE_WRITES,
    models::{
        purchase_invoice, purchase_invoice_line, purchase_order, purchase_order_line, receipt,
        supplier_quote, supplier_quote_line,
    },
    rich_text,
    storage::{preview_url, ObjectStorage, UploadOptions},
};

pub const UPLOAD_IMAGE_FAILED: &str = "Failed to upload image";

const IMAGE_CACHE_SECS: u64 = 60 * 60;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NoteTable {
    PurchaseOrder,
    PurchaseOrderLine,
    SupplierQuote,
    SupplierQuoteLine,
    Receipt,
    PurchaseInvoice,
    PurchaseInvoiceLine,
}

impl NoteTable {
    /// Quote headers, receipts and invoice lines only carry internal notes
    pub fn has_external(self) -> bool {
        !matches!(
            self,
            NoteTable::SupplierQuote | NoteTable::Receipt | NoteTable::PurchaseInvoiceLine
        )
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoteScope {
    Internal,
    External,
}

/// Tabs the caller may see on `table`, in display order
pub fn visible_scopes(table: NoteTable, user: &AuthUser) -> Vec<NoteScope> {
    let mut scopes = Vec::with_capacity(2);
    if user.is_employee() {
        scopes.push(NoteScope::Internal);
    }
    if table.has_external() {
        scopes.push(NoteScope::External);
    }
    scopes
}

pub fn default_scope(table: NoteTable, user: &AuthUser) -> Option<NoteScope> {
    if user.is_employee() {
        Some(NoteScope::Internal)
    } else if table.has_external() {
        Some(NoteScope::External)
    } else {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NoteKey {
    pub table: NoteTable,
    pub id: Uuid,
    pub scope: NoteScope,
    pub company_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct NoteEdit {
    pub content: Value,
    pub updated_by: Uuid,
}

/// Editors get the stored document, everyone else the rendered HTML
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "format", content = "content", rename_all = "lowercase")]
pub enum NoteBody {
    Json(Value),
    Html(String),
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct NotesView {
    pub table: NoteTable,
    pub id: Uuid,
    pub tabs: Vec<NoteScope>,
    pub default_tab: Option<NoteScope>,
    pub editable: bool,
    pub internal: Option<NoteBody>,
    pub external: Option<NoteBody>,
}

#[derive(Clone, Debug)]
pub struct NoteImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct NoteImageLink {
    pub path: String,
    pub url: String,
}

struct NoteRow {
    internal: Option<Value>,
    external: Option<Value>,
    interaction_id: Option<Uuid>,
}

struct NoteColumns<C> {
    id: C,
    company: C,
    internal: C,
    external: C,
    updated_by: C,
    updated_at: C,
}

async fn write_row<E: EntityTrait>(
    db: &DbPool,
    columns: NoteColumns<E::Column>,
    key: &NoteKey,
    edit: &NoteEdit,
) -> Result<u64, DbErr> {
    let notes = match key.scope {
        NoteScope::Internal => columns.internal,
        NoteScope::External => columns.external,
    };
    let result = E::update_many()
        .col_expr(notes, Expr::value(edit.content.clone()))
        .col_expr(columns.updated_by, Expr::value(edit.updated_by))
        .col_expr(columns.updated_at, Expr::value(Utc::now()))
        .filter(columns.id.eq(key.id))
        .filter(columns.company.eq(key.company_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Flushes note edits into the owning table
pub struct NoteStore {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

#[async_trait]
impl WriteSink<NoteKey, NoteEdit> for NoteStore {
    async fn write(&self, key: NoteKey, edit: NoteEdit) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let rows = match key.table {
            NoteTable::PurchaseOrder => {
                use purchase_order::Column;
                let columns = NoteColumns {
                    id: Column::Id,
                    company: Column::CompanyId,
                    internal: Column::InternalNotes,
                    external: Column::ExternalNotes,
                    updated_by: Column::UpdatedBy,
                    updated_at: Column::UpdatedAt,
                };
                write_row::<purchase_order::Entity>(db, columns, &key, &edit).await?
            }
            NoteTable::PurchaseOrderLine => {
                use purchase_order_line::Column;
                let columns = NoteColumns {
                    id: Column::Id,
                    company: Column::CompanyId,
                    internal: Column::InternalNotes,
                    external: Column::ExternalNotes,
                    updated_by: Column::UpdatedBy,
                    updated_at: Column::UpdatedAt,
                };
                write_row::<purchase_order_line::Entity>(db, columns, &key, &edit).await?
            }
            NoteTable::SupplierQuote => {
                use supplier_quote::Column;
                let columns = NoteColumns {
                    id: Column::Id,
                    company: Column::CompanyId,
                    internal: Column::InternalNotes,
                    external: Column::ExternalNotes,
                    updated_by: Column::UpdatedBy,
                    updated_at: Column::UpdatedAt,
                };
                write_row::<supplier_quote::Entity>(db, columns, &key, &edit).await?
            }
            NoteTable::SupplierQuoteLine => {
                use supplier_quote_line::Column;
                let columns = NoteColumns {
                    id: Column::Id,
                    company: Column::CompanyId,
                    internal: Column::InternalNotes,
                    external: Column::ExternalNotes,
                    updated_by: Column::UpdatedBy,
                    updated_at: Column::UpdatedAt,
                };
                write_row::<supplier_quote_line::Entity>(db, columns, &key, &edit).await?
            }
            NoteTable::Receipt => {
                use receipt::Column;
                let columns = NoteColumns {
                    id: Column::Id,
                    company: Column::CompanyId,
                    internal: Column::InternalNotes,
                    external: Column::ExternalNotes,
                    updated_by: Column::UpdatedBy,
                    updated_at: Column::UpdatedAt,
                };
                write_row::<receipt::Entity>(db, columns, &key, &edit).await?
            }
            NoteTable::PurchaseInvoice => {
                use purchase_invoice::Column;
                let columns = NoteColumns {
                    id: Column::Id,
                    company: Column::CompanyId,
                    internal: Column::InternalNotes,
                    external: Column::ExternalNotes,
                    updated_by: Column::UpdatedBy,
                    updated_at: Column::UpdatedAt,
                };
                write_row::<purchase_invoice::Entity>(db, columns, &key, &edit).await?
            }
            NoteTable::PurchaseInvoiceLine => {
                use purchase_invoice_line::Column;
                let columns = NoteColumns {
                    id: Column::Id,
                    company: Column::CompanyId,
                    internal: Column::InternalNotes,
                    external: Column::ExternalNotes,
                    updated_by: Column::UpdatedBy,
                    updated_at: Column::UpdatedAt,
                };
                write_row::<purchase_invoice_line::Entity>(db, columns, &key, &edit).await?
            }
        };

        if rows == 0 {
            return Err(ServiceError::not_found(&key.table.to_string(), key.id));
        }

        let table = key.table.to_string();
        let scope = key.scope.to_string();
        NOTE_WRITES.with_label_values(&[&table, &scope]).inc();
        slog::info!(self.logger, "notes saved";
            "table" => &table, "id" => %key.id, "scope" => &scope, "user_id" => %edit.updated_by);
        self.event_sender
            .send_or_log(Event::NotesUpdated {
                table,
                id: key.id,
                scope,
            })
            .await;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NoteSettings {
    pub quiet_period: Duration,
    pub bucket: String,
}

#[derive(Clone)]
pub struct NoteService {
    db_pool: Arc<DbPool>,
    storage: Arc<dyn ObjectStorage>,
    pending: PendingWrites<NoteKey, NoteEdit>,
    bucket: String,
    logger: Logger,
}

impl NoteService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        storage: Arc<dyn ObjectStorage>,
        settings: NoteSettings,
        logger: Logger,
    ) -> Self {
        let sink = Arc::new(NoteStore {
            db_pool: db_pool.clone(),
            event_sender,
            logger: logger.clone(),
        });
        Self {
            db_pool,
            storage,
            pending: PendingWrites::new("notes", settings.quiet_period, sink),
            bucket: settings.bucket,
            logger,
        }
    }

    pub fn pending(&self) -> &PendingWrites<NoteKey, NoteEdit> {
        &self.pending
    }

    fn can_edit(user: &AuthUser) -> bool {
        user.can(Action::Update, Module::Purchasing)
    }

    async fn load_row(
        &self,
        table: NoteTable,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<NoteRow, ServiceError> {
        let db = self.db_pool.as_ref();
        let row = match table {
            NoteTable::PurchaseOrder => purchase_order::Entity::find_by_id(id)
                .filter(purchase_order::Column::CompanyId.eq(company_id))
                .one(db)
                .await?
                .map(|r| NoteRow {
                    internal: r.internal_notes,
                    external: r.external_notes,
                    interaction_id: Some(r.supplier_interaction_id),
                }),
            NoteTable::PurchaseOrderLine => {
                match purchase_order_line::Entity::find_by_id(id)
                    .filter(purchase_order_line::Column::CompanyId.eq(company_id))
                    .one(db)
                    .await?
                {
                    Some(line) => {
                        let parent = purchase_order::Entity::find_by_id(line.purchase_order_id)
                            .one(db)
                            .await?;
                        Some(NoteRow {
                            internal: line.internal_notes,
                            external: line.external_notes,
                            interaction_id: parent.map(|p| p.supplier_interaction_id),
                        })
                    }
                    None => None,
                }
            }
            NoteTable::SupplierQuote => supplier_quote::Entity::find_by_id(id)
                .filter(supplier_quote::Column::CompanyId.eq(company_id))
                .one(db)
                .await?
                .map(|r| NoteRow {
                    internal: r.internal_notes,
                    external: r.external_notes,
                    interaction_id: Some(r.supplier_interaction_id),
                }),
            NoteTable::SupplierQuoteLine => {
                match supplier_quote_line::Entity::find_by_id(id)
                    .filter(supplier_quote_line::Column::CompanyId.eq(company_id))
                    .one(db)
                    .await?
                {
                    Some(line) => {
                        let parent = supplier_quote::Entity::find_by_id(line.supplier_quote_id)
                            .one(db)
                            .await?;
                        Some(NoteRow {
                            internal: line.internal_notes,
                            external: line.external_notes,
                            interaction_id: parent.map(|p| p.supplier_interaction_id),
                        })
                    }
                    None => None,
                }
            }
            NoteTable::Receipt => receipt::Entity::find_by_id(id)
                .filter(receipt::Column::CompanyId.eq(company_id))
                .one(db)
                .await?
                .map(|r| NoteRow {
                    internal: r.internal_notes,
                    external: r.external_notes,
                    interaction_id: r.supplier_interaction_id,
                }),
            NoteTable::PurchaseInvoice => purchase_invoice::Entity::find_by_id(id)
                .filter(purchase_invoice::Column::CompanyId.eq(company_id))
                .one(db)
                .await?
                .map(|r| NoteRow {
                    internal: r.internal_notes,
                    external: r.external_notes,
                    interaction_id: r.supplier_interaction_id,
                }),
            NoteTable::PurchaseInvoiceLine => {
                match purchase_invoice_line::Entity::find_by_id(id)
                    .filter(purchase_invoice_line::Column::CompanyId.eq(company_id))
                    .one(db)
                    .await?
                {
                    Some(line) => {
                        let parent = purchase_invoice::Entity::find_by_id(line.invoice_id)
                            .one(db)
                            .await?;
                        Some(NoteRow {
                            internal: line.internal_notes,
                            external: line.external_notes,
                            interaction_id: parent.and_then(|p| p.supplier_interaction_id),
                        })
                    }
                    None => None,
                }
            }
        };
        row.ok_or_else(|| ServiceError::not_found(&table.to_string(), id))
    }

    #[instrument(skip(self, user), fields(company_id = %user.company_id))]
    pub async fn get_notes(
        &self,
        user: &AuthUser,
        table: NoteTable,
        id: Uuid,
    ) -> Result<NotesView, ServiceError> {
        let row = self.load_row(table, id, user.company_id).await?;
        let tabs = visible_scopes(table, user);
        let editable = Self::can_edit(user);

        let body = |content: Option<Value>| {
            let doc = content.unwrap_or_else(rich_text::empty_document);
            if editable {
                NoteBody::Json(doc)
            } else {
                NoteBody::Html(rich_text::to_html(&doc))
            }
        };
        let internal = tabs
            .contains(&NoteScope::Internal)
            .then(|| body(row.internal));
        let external = tabs
            .contains(&NoteScope::External)
            .then(|| body(row.external));

        Ok(NotesView {
            table,
            id,
            default_tab: default_scope(table, user),
            tabs,
            editable,
            internal,
            external,
        })
    }

    fn check_scope(
        &self,
        user: &AuthUser,
        table: NoteTable,
        scope: NoteScope,
    ) -> Result<(), ServiceError> {
        if !Self::can_edit(user) {
            return Err(ServiceError::Forbidden(
                "update_purchasing is required to edit notes".to_string(),
            ));
        }
        if !visible_scopes(table, user).contains(&scope) {
            return Err(ServiceError::Forbidden(format!(
                "{} notes are not available on {}",
                scope, table
            )));
        }
        Ok(())
    }

    /// Queues `content` as the latest edit; returns the slot generation
    #[instrument(skip(self, user, content), fields(company_id = %user.company_id))]
    pub async fn push_edit(
        &self,
        user: &AuthUser,
        table: NoteTable,
        id: Uuid,
        scope: NoteScope,
        content: Value,
    ) -> Result<u64, ServiceError> {
        self.check_scope(user, table, scope)?;
        if !content.is_object() {
            return Err(ServiceError::ValidationError(
                "Notes must be a rich text document".to_string(),
            ));
        }
        self.load_row(table, id, user.company_id).await?;

        let key = NoteKey {
            table,
            id,
            scope,
            company_id: user.company_id,
        };
        let generation = self.pending.push(
            key,
            NoteEdit {
                content,
                updated_by: user.user_id,
            },
        );
        debug!(%table, %id, %scope, generation, "note edit queued");
        Ok(generation)
    }

    /// Writes both scopes of a record now; returns how many were pending
    #[instrument(skip(self, user))]
    pub async fn flush(
        &self,
        user: &AuthUser,
        table: NoteTable,
        id: Uuid,
    ) -> Result<usize, ServiceError> {
        let mut flushed = 0;
        for scope in [NoteScope::Internal, NoteScope::External] {
            let key = NoteKey {
                table,
                id,
                scope,
                company_id: user.company_id,
            };
            if self.pending.flush(&key).await? {
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Stores an image for embedding and returns its private preview link
    #[instrument(skip(self, user, image), fields(file_name = %image.file_name))]
    pub async fn upload_image(
        &self,
        user: &AuthUser,
        table: NoteTable,
        id: Uuid,
        image: NoteImage,
    ) -> Result<NoteImageLink, StepError> {
        if !Self::can_edit(user) {
            return Err(StepError::new(
                UPLOAD_IMAGE_FAILED,
                ServiceError::Forbidden("update_purchasing is required to upload images".into()),
            ));
        }
        if !image.content_type.starts_with("image/") || image.bytes.is_empty() {
            return Err(StepError::new(
                UPLOAD_IMAGE_FAILED,
                ServiceError::ValidationError(format!(
                    "expected an image, got {}",
                    image.content_type
                )),
            ));
        }

        let row = self
            .load_row(table, id, user.company_id)
            .await
            .step(UPLOAD_IMAGE_FAILED)?;
        let interaction_id = row.interaction_id.ok_or_else(|| {
            StepError::missing(UPLOAD_IMAGE_FAILED)
        })?;

        let file_name = format!("{}.{}", nanoid(), image_extension(&image.file_name));
        let path = interaction_path(user.company_id, interaction_id, &file_name);
        let options = UploadOptions::new(image.content_type.clone(), IMAGE_CACHE_SECS);
        self.storage
            .upload(&self.bucket, &path, image.bytes, &options)
            .await
            .step(UPLOAD_IMAGE_FAILED)?;

        slog::info!(self.logger, "note image uploaded"; "path" => &path, "user_id" => %user.user_id);
        Ok(NoteImageLink {
            url: preview_url(&self.bucket, &path),
            path,
        })
    }
}

/// Lowercased extension of an uploaded file, `png` when it has none
fn image_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PermissionMatrix, Role};
    use rstest::rstest;
    use std::str::FromStr;

    fn user(role: Role) -> AuthUser {
        AuthUser::new(Uuid::new_v4(), Uuid::new_v4(), role, PermissionMatrix::full())
    }

    #[rstest]
    #[case(NoteTable::PurchaseOrder, vec![NoteScope::Internal, NoteScope::External])]
    #[case(NoteTable::PurchaseOrderLine, vec![NoteScope::Internal, NoteScope::External])]
    #[case(NoteTable::SupplierQuote, vec![NoteScope::Internal])]
    #[case(NoteTable::SupplierQuoteLine, vec![NoteScope::Internal, NoteScope::External])]
    #[case(NoteTable::Receipt, vec![NoteScope::Internal])]
    #[case(NoteTable::PurchaseInvoice, vec![NoteScope::Internal, NoteScope::External])]
    #[case(NoteTable::PurchaseInvoiceLine, vec![NoteScope::Internal])]
    fn employee_tabs(#[case] table: NoteTable, #[case] expected: Vec<NoteScope>) {
        let employee = user(Role::Employee);
        assert_eq!(visible_scopes(table, &employee), expected);
        assert_eq!(default_scope(table, &employee), Some(NoteScope::Internal));
    }

    #[test]
    fn suppliers_never_see_internal_tab() {
        let supplier = user(Role::Supplier);
        assert_eq!(
            visible_scopes(NoteTable::PurchaseOrder, &supplier),
            vec![NoteScope::External]
        );
        assert_eq!(
            default_scope(NoteTable::PurchaseOrder, &supplier),
            Some(NoteScope::External)
        );
        assert!(visible_scopes(NoteTable::SupplierQuote, &supplier).is_empty());
        assert_eq!(default_scope(NoteTable::SupplierQuote, &supplier), None);
    }

    #[test]
    fn table_names_use_camel_case() {
        assert_eq!(NoteTable::PurchaseOrderLine.to_string(), "purchaseOrderLine");
        assert_eq!(
            NoteTable::from_str("supplierQuote").unwrap(),
            NoteTable::SupplierQuote
        );
        assert_eq!(
            NoteTable::from_str("purchaseInvoiceLine").unwrap(),
            NoteTable::PurchaseInvoiceLine
        );
        assert_eq!(NoteTable::Receipt.to_string(), "receipt");
        assert_eq!(NoteScope::from_str("external").unwrap(), NoteScope::External);
    }

    #[rstest]
    #[case("diagram.PNG", "png")]
    #[case("scan.final.jpeg", "jpeg")]
    #[case("noext", "png")]
    #[case("weird.<svg>", "png")]
    fn extensions(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(image_extension(name), expected);
    }

    #[test]
    fn html_body_is_tagged() {
        let body = NoteBody::Html("<p>x</p>".into());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "format": "html", "content": "<p>x</p>" })
        );
    }
}
