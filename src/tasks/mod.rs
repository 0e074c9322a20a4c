//! Background tasks: payloads, the enqueue side and the consuming worker.
//!
//! Callers only wait for the enqueue. The worker picks tasks up by topic and
//! acks or nacks them once the handler returns.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::email::{EmailAttachment, EmailMessage, EmailSender};
use crate::errors::ServiceError;
use crate::message_queue::{Message, MessageQueue};

mod worker;

pub use worker::TaskWorker;

pub const SEND_EMAIL: &str = "send-email-resend";
pub const USER_ADMIN: &str = "user-admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPayload {
    /// Base64 of the file bytes
    pub content: String,
    pub filename: String,
}

impl AttachmentPayload {
    pub fn encode(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            content: STANDARD.encode(bytes),
            filename: filename.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailPayload {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub html: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
    pub company_id: Uuid,
}

impl SendEmailPayload {
    pub fn into_message(self) -> Result<EmailMessage, ServiceError> {
        let attachments = self
            .attachments
            .into_iter()
            .map(|a| {
                let content = STANDARD.decode(a.content.as_bytes()).map_err(|e| {
                    ServiceError::SerializationError(format!(
                        "attachment {} is not base64: {}",
                        a.filename, e
                    ))
                })?;
                Ok(EmailAttachment {
                    content_type: content_type_for(&a.filename).to_string(),
                    filename: a.filename,
                    content: Bytes::from(content),
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        Ok(EmailMessage {
            to: self.to,
            from: self.from,
            subject: self.subject,
            html: self.html,
            text: self.text,
            attachments,
            entity_ref_id: None,
        })
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserAdminPayload {
    Deactivate {
        id: Uuid,
        #[serde(rename = "companyId")]
        company_id: Uuid,
    },
    Resend {
        id: Uuid,
        location: String,
        ip: String,
        #[serde(rename = "companyId")]
        company_id: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
}

impl TaskResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Consumer side of one task topic
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, payload: serde_json::Value) -> Result<TaskResult, ServiceError>;
}

/// Enqueue side of the task runner
#[derive(Clone)]
pub struct TaskQueue {
    queue: Arc<dyn MessageQueue>,
}

impl TaskQueue {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> Arc<dyn MessageQueue> {
        Arc::clone(&self.queue)
    }

    /// Publishes `payload` under `task_id` and returns the message id
    #[instrument(skip(self, payload))]
    pub async fn trigger<P: Serialize + Send + Sync>(
        &self,
        task_id: &str,
        payload: &P,
    ) -> Result<Uuid, ServiceError> {
        let message = Message::new(task_id, serde_json::to_value(payload)?);
        let id = message.id;
        self.queue.publish(message).await?;
        info!(task = task_id, %id, "task enqueued");
        Ok(id)
    }

    pub async fn send_email(&self, payload: &SendEmailPayload) -> Result<Uuid, ServiceError> {
        self.trigger(SEND_EMAIL, payload).await
    }

    pub async fn user_admin(&self, payload: &UserAdminPayload) -> Result<Uuid, ServiceError> {
        self.trigger(USER_ADMIN, payload).await
    }
}

/// Delivers `send-email-resend` payloads through the configured sender
pub struct SendEmailHandler {
    sender: Arc<dyn EmailSender>,
}

impl SendEmailHandler {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl TaskHandler for SendEmailHandler {
    async fn handle(&self, payload: serde_json::Value) -> Result<TaskResult, ServiceError> {
        let payload: SendEmailPayload = serde_json::from_value(payload)?;
        let company_id = payload.company_id;
        let message = payload.into_message()?;
        let subject = message.subject.clone();
        self.sender.send(message).await?;
        info!(%company_id, %subject, "email delivered");
        Ok(TaskResult::ok(format!("Sent {}", subject)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::LogEmailSender;
    use crate::message_queue::InMemoryMessageQueue;
    use serde_json::json;

    fn payload() -> SendEmailPayload {
        SendEmailPayload {
            to: vec!["buyer@acme.test".into(), "sales@supplier.test".into()],
            from: "buyer@acme.test".into(),
            subject: "PO000001 from Acme".into(),
            html: "<p>hi</p>".into(),
            text: Some("hi".into()),
            attachments: vec![AttachmentPayload::encode("PO000001.pdf", b"%PDF-1.4")],
            company_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn email_payload_uses_camel_case() {
        let value = serde_json::to_value(payload()).unwrap();
        assert!(value.get("companyId").is_some());
        assert_eq!(value["attachments"][0]["filename"], "PO000001.pdf");
    }

    #[test]
    fn user_admin_payload_is_tagged() {
        let id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let parsed: UserAdminPayload = serde_json::from_value(json!({
            "type": "resend",
            "id": id,
            "location": "Berlin",
            "ip": "203.0.113.9",
            "companyId": company_id,
        }))
        .unwrap();
        assert_eq!(
            parsed,
            UserAdminPayload::Resend {
                id,
                location: "Berlin".into(),
                ip: "203.0.113.9".into(),
                company_id
            }
        );
    }

    #[test]
    fn attachments_are_decoded() {
        let message = payload().into_message().unwrap();
        assert_eq!(message.attachments[0].content.as_ref(), b"%PDF-1.4");
        assert_eq!(message.attachments[0].content_type, "application/pdf");
    }

    #[test]
    fn bad_base64_is_rejected() {
        let mut p = payload();
        p.attachments[0].content = "***".into();
        assert_eq!(p.into_message().unwrap_err().kind(), "serialization");
    }

    #[tokio::test]
    async fn trigger_publishes_on_topic() {
        let queue = Arc::new(InMemoryMessageQueue::new());
        let tasks = TaskQueue::new(queue.clone());
        let id = tasks.send_email(&payload()).await.unwrap();

        let pending = queue.pending(SEND_EMAIL);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
    }

    #[tokio::test]
    async fn send_email_handler_delivers() {
        let sender = Arc::new(LogEmailSender::new());
        let handler = SendEmailHandler::new(sender.clone());
        let result = handler
            .handle(serde_json::to_value(payload()).unwrap())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(sender.sent()[0].to.len(), 2);
    }
}
