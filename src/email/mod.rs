//! Outbound email: message types, templates and the sender seam.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[cfg(feature = "smtp")]
mod smtp;
pub mod templates;

#[cfg(feature = "smtp")]
pub use smtp::SmtpEmailSender;
pub use templates::{InviteEmail, PurchaseOrderEmail, RenderedEmail};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("could not build message: {0}")]
    Build(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub attachments: Vec<EmailAttachment>,
    /// Sent as `X-Entity-Ref-ID` so clients do not thread unrelated mail
    pub entity_ref_id: Option<String>,
}

impl EmailMessage {
    pub fn validate_addresses(&self) -> Result<(), EmailError> {
        if self.to.is_empty() {
            return Err(EmailError::InvalidAddress("no recipients".into()));
        }
        for address in self.to.iter().chain(std::iter::once(&self.from)) {
            if !looks_like_address(address) {
                return Err(EmailError::InvalidAddress(address.clone()));
            }
        }
        Ok(())
    }
}

/// Accepts `user@host` and `Name <user@host>`
fn looks_like_address(raw: &str) -> bool {
    let addr = match (raw.find('<'), raw.rfind('>')) {
        (Some(start), Some(end)) if start < end => &raw[start + 1..end],
        _ => raw,
    };
    match addr.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !addr.contains(' ')
        }
        None => false,
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Logs messages and keeps them for inspection instead of delivering them
#[derive(Debug, Default)]
pub struct LogEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl LogEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        message.validate_addresses()?;
        info!(
            to = ?message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "email accepted by log sender"
        );
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn message(to: &[&str]) -> EmailMessage {
        EmailMessage {
            to: to.iter().map(|s| s.to_string()).collect(),
            from: "ERP <no-reply@erp.local>".into(),
            subject: "hi".into(),
            html: "<p>hi</p>".into(),
            text: None,
            attachments: vec![],
            entity_ref_id: None,
        }
    }

    #[tokio::test]
    async fn log_sender_keeps_messages() {
        let sender = LogEmailSender::new();
        sender.send(message(&["buyer@acme.test"])).await.unwrap();
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn bad_addresses_are_refused() {
        let sender = LogEmailSender::new();
        assert_matches!(
            sender.send(message(&["not an address"])).await,
            Err(EmailError::InvalidAddress(_))
        );
        assert_matches!(sender.send(message(&[])).await, Err(EmailError::InvalidAddress(_)));
        assert!(sender.sent().is_empty());
    }
}
