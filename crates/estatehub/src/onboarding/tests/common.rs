use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::auth::TokenService;
use crate::notify::{Delivery, EmailMessage, MailError, Mailer};
use crate::onboarding::{
    Builder, BuilderId, BuilderRepository, BuilderStatus, OnboardingService, OtpId, OtpRecord,
    OtpRepository, SignupForm,
};
use crate::storage::{MemoryStore, RepositoryError};

pub(super) const EMAIL: &str = "builder@acme.in";
pub(super) const PASSWORD: &str = "s3cure-pass";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0)
        .single()
        .expect("valid time")
}

#[derive(Default)]
pub(super) struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingMailer {
    pub(super) fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(super) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }

    pub(super) fn last(&self) -> EmailMessage {
        self.sent().pop().expect("an email was sent")
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<Delivery, MailError> {
        if self.fail {
            return Err(MailError::Rejected {
                status: 503,
                body: "provider down".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(message);
        Ok(Delivery::Sent)
    }
}

pub(super) struct Harness {
    pub(super) service: OnboardingService,
    pub(super) store: Arc<MemoryStore>,
    pub(super) mailer: Arc<RecordingMailer>,
    pub(super) tokens: Arc<TokenService>,
}

pub(super) fn harness() -> Harness {
    harness_with_mailer(RecordingMailer::default())
}

pub(super) fn harness_with_mailer(mailer: RecordingMailer) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(mailer);
    let tokens = Arc::new(TokenService::new("onboarding-secret", 24));
    let service = OnboardingService::new(
        store.clone(),
        store.clone(),
        mailer.clone(),
        tokens.clone(),
        "https://estatehub.example",
    )
    .with_password_cost(4);

    Harness {
        service,
        store,
        mailer,
        tokens,
    }
}

pub(super) fn signup_form() -> SignupForm {
    SignupForm {
        email: EMAIL.to_string(),
        password: PASSWORD.to_string(),
        full_name: "Asha Rao".to_string(),
        phone: "+91 98765 43210".to_string(),
        company_name: "Acme Developers".to_string(),
        company_address: "Baner, Pune".to_string(),
        gst_number: "27ABCDE1234F1Z5".to_string(),
        pan_number: "ABCDE1234F".to_string(),
        registration_certificate: None,
        gst_certificate: None,
    }
}

/// Code from the most recent unverified OTP stored for `email`.
pub(super) async fn stored_code(store: &MemoryStore, email: &str) -> String {
    store
        .latest(email, false)
        .await
        .expect("otp query")
        .expect("otp stored")
        .code
}

/// Walks an email through send, verify and signup, returning the pending builder id.
pub(super) async fn register(harness: &Harness) -> BuilderId {
    harness
        .service
        .send_otp_at(EMAIL, now())
        .await
        .expect("otp sent");
    let code = stored_code(&harness.store, EMAIL).await;
    harness
        .service
        .verify_otp_at(EMAIL, &code, now())
        .await
        .expect("otp verified");
    harness
        .service
        .signup_at(signup_form(), now())
        .await
        .expect("signup succeeds")
}

/// Extracts the temporary password from an approval email.
pub(super) fn temporary_password(message: &EmailMessage) -> String {
    let text = message.text.as_deref().expect("approval email has text body");
    text.lines()
        .find_map(|line| line.strip_prefix("Temporary password: "))
        .expect("temporary password line")
        .to_string()
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

#[async_trait]
impl BuilderRepository for UnavailableStore {
    async fn insert(&self, _builder: Builder) -> Result<Builder, RepositoryError> {
        offline()
    }

    async fn update(&self, _builder: Builder) -> Result<(), RepositoryError> {
        offline()
    }

    async fn fetch(&self, _id: &BuilderId) -> Result<Option<Builder>, RepositoryError> {
        offline()
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<Builder>, RepositoryError> {
        offline()
    }

    async fn list_by_status(
        &self,
        _status: Option<BuilderStatus>,
    ) -> Result<Vec<Builder>, RepositoryError> {
        offline()
    }

    async fn count_by_status(&self, _status: BuilderStatus) -> Result<usize, RepositoryError> {
        offline()
    }
}

#[async_trait]
impl OtpRepository for UnavailableStore {
    async fn insert(&self, _record: OtpRecord) -> Result<(), RepositoryError> {
        offline()
    }

    async fn latest(
        &self,
        _email: &str,
        _verified: bool,
    ) -> Result<Option<OtpRecord>, RepositoryError> {
        offline()
    }

    async fn update(&self, _record: OtpRecord) -> Result<(), RepositoryError> {
        offline()
    }

    async fn delete(&self, _id: &OtpId) -> Result<(), RepositoryError> {
        offline()
    }

    async fn delete_for_email(&self, _email: &str) -> Result<usize, RepositoryError> {
        offline()
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        offline()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
