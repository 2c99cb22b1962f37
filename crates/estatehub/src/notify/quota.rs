use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use super::mailer::{Delivery, EmailMessage, MailError, Mailer};

/// Send counter for the current UTC day.
///
/// Lives in process memory only: every instance of the service keeps its own count, so a
/// multi-instance deployment can exceed the provider quota.
#[derive(Debug)]
struct QuotaState {
    day: NaiveDate,
    sent: u32,
    last_sent: Option<Instant>,
}

impl QuotaState {
    fn roll(&mut self, today: NaiveDate) {
        if today != self.day {
            self.day = today;
            self.sent = 0;
        }
    }
}

/// Enforces a daily send quota and minimum spacing between sends.
pub struct QuotaMailer<M> {
    inner: M,
    daily_limit: u32,
    min_interval: Duration,
    state: Mutex<QuotaState>,
}

impl<M: Mailer> QuotaMailer<M> {
    pub fn new(inner: M, daily_limit: u32, min_interval: Duration) -> Self {
        Self {
            inner,
            daily_limit,
            min_interval,
            state: Mutex::new(QuotaState {
                day: Utc::now().date_naive(),
                sent: 0,
                last_sent: None,
            }),
        }
    }

    pub async fn sent_today(&self) -> u32 {
        let mut state = self.state.lock().await;
        state.roll(Utc::now().date_naive());
        state.sent
    }
}

#[async_trait]
impl<M: Mailer> Mailer for QuotaMailer<M> {
    async fn send(&self, message: EmailMessage) -> Result<Delivery, MailError> {
        // Held across the pacing sleep so concurrent sends queue up behind each other.
        let mut state = self.state.lock().await;
        state.roll(Utc::now().date_naive());

        if state.sent >= self.daily_limit {
            tracing::warn!(limit = self.daily_limit, "daily email limit reached");
            return Err(MailError::QuotaExceeded {
                limit: self.daily_limit,
            });
        }
        state.sent += 1;

        if let Some(last) = state.last_sent {
            sleep_until(last + self.min_interval).await;
        }
        state.last_sent = Some(Instant::now());

        let delivery = self.inner.send(message).await?;
        tracing::debug!(sent = state.sent, limit = self.daily_limit, "email quota usage");
        Ok(delivery)
    }
}
