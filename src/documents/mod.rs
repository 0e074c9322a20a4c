//! Document rendering for released purchase orders, and the naming rules for
//! the files it produces.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    company, purchase_order, purchase_order_delivery, purchase_order_line, supplier,
};

mod http;

pub use self::http::HttpDocumentRenderer;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// `source_document` recorded on purchase order attachments
pub const PURCHASE_ORDER_SOURCE: &str = "Purchase Order";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer unreachable: {0}")]
    Transport(String),
    #[error("renderer answered with status {0}")]
    Status(u16),
    #[error("expected application/pdf, got {0}")]
    UnexpectedContentType(String),
    #[error("renderer returned an empty document")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Bytes,
    pub content_type: String,
}

impl RenderedDocument {
    pub fn pdf(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: PDF_CONTENT_TYPE.to_string(),
        }
    }

    /// Passes the document through only when it is a non-empty PDF
    pub fn ensure_pdf(self) -> Result<Self, RenderError> {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence != PDF_CONTENT_TYPE {
            return Err(RenderError::UnexpectedContentType(self.content_type));
        }
        if self.bytes.is_empty() {
            return Err(RenderError::Empty);
        }
        Ok(self)
    }

    /// Size as recorded on the attachment row
    pub fn size_kib(&self) -> i64 {
        size_in_kib(self.bytes.len())
    }
}

/// Everything the renderer needs to lay out a purchase order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderSnapshot {
    pub purchase_order: purchase_order::Model,
    pub lines: Vec<purchase_order_line::Model>,
    pub company: company::Model,
    pub supplier: Option<supplier::Model>,
    pub delivery: Option<purchase_order_delivery::Model>,
    pub locale: String,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_purchase_order(
        &self,
        snapshot: &PurchaseOrderSnapshot,
    ) -> Result<RenderedDocument, RenderError>;
}

/// Renderer that returns a fixed PDF, for development and tests
#[derive(Debug, Default)]
pub struct StaticPdfRenderer {
    failing: AtomicBool,
}

impl StaticPdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentRenderer for StaticPdfRenderer {
    async fn render_purchase_order(
        &self,
        snapshot: &PurchaseOrderSnapshot,
    ) -> Result<RenderedDocument, RenderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RenderError::Status(500));
        }
        let body = format!(
            "%PDF-1.4\n% {} {}\n%%EOF\n",
            snapshot.purchase_order.purchase_order_id, snapshot.purchase_order.status
        );
        Ok(RenderedDocument::pdf(body.into_bytes()))
    }
}

pub fn size_in_kib(bytes: usize) -> i64 {
    ((bytes as f64) / 1024.0).round() as i64
}

/// Keeps ASCII letters, digits, spaces and `-_.`
pub fn strip_special_characters(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .collect()
}

/// `{number} - {timestamp}.pdf` with the timestamp at second precision
pub fn release_file_name(purchase_order_number: &str, at: DateTime<Utc>) -> String {
    strip_special_characters(&format!(
        "{} - {}.pdf",
        purchase_order_number,
        at.format("%Y-%m-%dT%H:%M:%S")
    ))
}

/// Storage path of any file attached to a supplier interaction
pub fn interaction_path(company_id: Uuid, interaction_id: Uuid, file_name: &str) -> String {
    format!(
        "{}/supplier-interaction/{}/{}",
        company_id, interaction_id, file_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn file_name_drops_separators_and_subseconds() {
        let at = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 5, 7)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(789))
            .unwrap();
        assert_eq!(
            release_file_name("PO000123", at),
            "PO000123 - 2024-06-01T090507.pdf"
        );
    }

    #[test]
    fn strip_keeps_allowed_set() {
        assert_eq!(strip_special_characters("PO/12#3: a_b-c.pdf"), "PO123 a_b-c.pdf");
        assert_eq!(strip_special_characters("Ünïcode"), "ncode");
    }

    #[test]
    fn interaction_path_layout() {
        let company = Uuid::nil();
        let interaction = Uuid::from_u128(1);
        assert_eq!(
            interaction_path(company, interaction, "a.pdf"),
            format!("{}/supplier-interaction/{}/a.pdf", company, interaction)
        );
    }

    #[test]
    fn size_rounds_to_nearest_kib() {
        assert_eq!(size_in_kib(0), 0);
        assert_eq!(size_in_kib(511), 0);
        assert_eq!(size_in_kib(512), 1);
        assert_eq!(size_in_kib(1536), 2);
        assert_eq!(size_in_kib(10 * 1024), 10);
    }

    #[test]
    fn ensure_pdf_checks_content_type() {
        assert!(RenderedDocument::pdf(b"%PDF".to_vec()).ensure_pdf().is_ok());

        let with_params = RenderedDocument {
            bytes: Bytes::from_static(b"%PDF"),
            content_type: "Application/PDF; charset=binary".into(),
        };
        assert!(with_params.ensure_pdf().is_ok());

        let html = RenderedDocument {
            bytes: Bytes::from_static(b"<html>"),
            content_type: "text/html".into(),
        };
        assert_matches!(html.ensure_pdf(), Err(RenderError::UnexpectedContentType(_)));
        assert_matches!(
            RenderedDocument::pdf(Vec::new()).ensure_pdf(),
            Err(RenderError::Empty)
        );
    }
}
