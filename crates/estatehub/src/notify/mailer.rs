use async_trait::async_trait;
use serde::Serialize;

/// Rendered email ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Whether a message actually left the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No provider is configured; the message was logged instead.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("daily email limit reached ({limit}/day)")]
    QuotaExceeded { limit: u32 },
    #[error("email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("email transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<Delivery, MailError>;
}

/// Stand-in used when no provider credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<Delivery, MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "email delivery not configured, skipping send");
        Ok(Delivery::Skipped)
    }
}
