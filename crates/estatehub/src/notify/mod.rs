//! Outbound email: provider clients, the per-process quota, and message templates.

pub mod mailer;
pub mod quota;
pub mod sendgrid;
pub mod templates;

pub use mailer::{Delivery, EmailMessage, LogMailer, MailError, Mailer};
pub use quota::QuotaMailer;
pub use sendgrid::SendGridMailer;

use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;

/// Picks the provider from configuration and wraps it in the send quota.
pub fn mailer_from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    let pacing = Duration::from_millis(config.min_interval_ms);
    match (&config.sendgrid_api_key, &config.from_address) {
        (Some(api_key), Some(from)) => Arc::new(QuotaMailer::new(
            SendGridMailer::new(api_key.clone(), from.clone()),
            config.daily_limit,
            pacing,
        )),
        _ => {
            tracing::warn!("SENDGRID_API_KEY or MAIL_FROM unset; emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}
