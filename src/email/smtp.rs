use async_trait::async_trait;
use lettre::{
    message::{
        header::{ContentType, Header, HeaderName, HeaderValue},
        Attachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument};

use super::{EmailError, EmailMessage, EmailSender};
use crate::config::EmailConfig;

#[derive(Clone)]
struct EntityRefId(String);

impl Header for EntityRefId {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Entity-Ref-ID")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Delivers mail through an SMTP relay with STARTTLS
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| EmailError::Transport("smtp_host is not configured".into()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| EmailError::Transport(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn build(message: &EmailMessage) -> Result<Message, EmailError> {
        let from: Mailbox = message
            .from
            .parse()
            .map_err(|_| EmailError::InvalidAddress(message.from.clone()))?;
        let mut builder = Message::builder().from(from).subject(message.subject.clone());
        for to in &message.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.clone()))?;
            builder = builder.to(mailbox);
        }
        if let Some(id) = &message.entity_ref_id {
            builder = builder.header(EntityRefId(id.clone()));
        }

        let body = match &message.text {
            Some(text) => MultiPart::alternative_plain_html(text.clone(), message.html.clone()),
            None => MultiPart::alternative().singlepart(SinglePart::html(message.html.clone())),
        };
        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in &message.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| EmailError::Build(format!("bad content type: {}", e)))?;
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.to_vec(), content_type),
            );
        }

        builder
            .multipart(mixed)
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        message.validate_addresses()?;
        let email = Self::build(&message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        info!(recipients = message.to.len(), "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::EmailAttachment;
    use bytes::Bytes;

    #[test]
    fn builds_multipart_with_attachment_and_ref_header() {
        let message = EmailMessage {
            to: vec!["buyer@acme.test".into(), "Sam <sales@supplier.test>".into()],
            from: "buyer@acme.test".into(),
            subject: "PO000001 from Acme".into(),
            html: "<p>hi</p>".into(),
            text: Some("hi".into()),
            attachments: vec![EmailAttachment {
                filename: "PO000001.pdf".into(),
                content: Bytes::from_static(b"%PDF-1.4"),
                content_type: "application/pdf".into(),
            }],
            entity_ref_id: Some("abc123".into()),
        };
        let built = SmtpEmailSender::build(&message).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();
        assert!(raw.contains("X-Entity-Ref-ID: abc123"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("PO000001.pdf"));
    }
}
