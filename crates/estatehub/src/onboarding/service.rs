use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};

use super::domain::{
    Builder, BuilderDocuments, BuilderId, BuilderOverview, BuilderStatus, BuilderView,
    CompanyDetails, SignupForm,
};
use super::otp::{OtpCheck, OtpRecord, OTP_TTL_MINUTES};
use super::repository::{BuilderRepository, OtpRepository};
use crate::auth::{self, PasswordError, Role, TokenError, TokenService};
use crate::contact::{is_valid_email, normalize_email};
use crate::http::HttpFailure;
use crate::notify::{templates, Delivery, MailError, Mailer};
use crate::storage::RepositoryError;

pub const DEFAULT_REJECTION_REASON: &str = "Application did not meet requirements";
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration, verification and approval of builder accounts.
#[derive(Clone)]
pub struct OnboardingService {
    builders: Arc<dyn BuilderRepository>,
    otps: Arc<dyn OtpRepository>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<TokenService>,
    public_url: String,
    password_cost: u32,
}

/// Successful builder login.
#[derive(Debug, Clone)]
pub struct BuilderLogin {
    pub builder: BuilderView,
    pub token: String,
}

/// Result of an admin decision. The decision is stored even when the email fails.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub builder: BuilderView,
    pub email_delivered: bool,
}

impl OnboardingService {
    pub fn new(
        builders: Arc<dyn BuilderRepository>,
        otps: Arc<dyn OtpRepository>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<TokenService>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            builders,
            otps,
            mailer,
            tokens,
            public_url: public_url.into(),
            password_cost: auth::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost; tests use the minimum to stay fast.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn token_service(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn send_otp(&self, email: &str) -> Result<Delivery, OnboardingError> {
        self.send_otp_at(email, Utc::now()).await
    }

    /// Replaces any outstanding codes for the email and mails a fresh one.
    /// `Ok(Delivery::Skipped)` means the code was stored but no provider sent it.
    pub async fn send_otp_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Delivery, OnboardingError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(OnboardingError::InvalidEmail);
        }
        if self.builders.find_by_email(&email).await?.is_some() {
            return Err(OnboardingError::AlreadyRegistered);
        }

        self.otps.delete_for_email(&email).await?;
        let record = OtpRecord::issue(&email, now);
        let message = templates::otp_email(&email, &record.code, OTP_TTL_MINUTES);
        self.otps.insert(record).await?;

        let delivery = self.mailer.send(message).await?;
        if delivery == Delivery::Skipped {
            tracing::warn!(email = %email, "verification code stored but not emailed");
        } else {
            tracing::info!(email = %email, "verification code issued");
        }
        Ok(delivery)
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<(), OnboardingError> {
        self.verify_otp_at(email, code, Utc::now()).await
    }

    pub async fn verify_otp_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OnboardingError> {
        let email = normalize_email(email);
        if email.is_empty() || code.trim().is_empty() {
            return Err(OnboardingError::MissingOtpFields);
        }

        let mut record = self
            .otps
            .latest(&email, false)
            .await?
            .ok_or(OnboardingError::OtpNotFound)?;

        match record.check(code, now) {
            OtpCheck::Verified => {
                self.otps.update(record).await?;
                tracing::info!(email = %email, "email verified");
                Ok(())
            }
            OtpCheck::Expired => {
                self.otps.delete(&record.id).await?;
                Err(OnboardingError::OtpExpired)
            }
            OtpCheck::Exhausted => {
                self.otps.delete(&record.id).await?;
                Err(OnboardingError::OtpAttemptsExhausted)
            }
            OtpCheck::Mismatch { remaining } => {
                self.otps.update(record).await?;
                tracing::debug!(email = %email, remaining, "verification code mismatch");
                Err(OnboardingError::OtpMismatch { remaining })
            }
        }
    }

    pub async fn signup(&self, form: SignupForm) -> Result<BuilderId, OnboardingError> {
        self.signup_at(form, Utc::now()).await
    }

    /// Creates a pending builder for an email verified within the code lifetime.
    pub async fn signup_at(
        &self,
        form: SignupForm,
        now: DateTime<Utc>,
    ) -> Result<BuilderId, OnboardingError> {
        if !form.is_complete() {
            return Err(OnboardingError::MissingSignupFields);
        }

        let email = normalize_email(&form.email);
        let verified = self.otps.latest(&email, true).await?;
        if !verified.is_some_and(|record| !record.is_expired(now)) {
            return Err(OnboardingError::EmailNotVerified);
        }
        if self.builders.find_by_email(&email).await?.is_some() {
            return Err(OnboardingError::DuplicateEmail);
        }

        let password_hash = auth::password::hash(form.password, self.password_cost).await?;
        let builder = Builder {
            id: BuilderId::generate(),
            email: email.clone(),
            password_hash,
            full_name: form.full_name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            company: CompanyDetails {
                name: form.company_name.trim().to_string(),
                address: form.company_address.trim().to_string(),
                gst_number: form.gst_number.trim().to_string(),
                pan_number: form.pan_number.trim().to_string(),
            },
            documents: BuilderDocuments {
                registration_certificate: form.registration_certificate,
                gst_certificate: form.gst_certificate,
            },
            status: BuilderStatus::Pending,
            email_verified: true,
            must_change_password: false,
            approved_by: None,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let stored = match self.builders.insert(builder).await {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(OnboardingError::DuplicateEmail),
            Err(other) => return Err(other.into()),
        };
        self.otps.delete_for_email(&email).await?;

        tracing::info!(builder_id = %stored.id, email = %email, "builder registered, awaiting approval");
        Ok(stored.id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<BuilderLogin, OnboardingError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(OnboardingError::MissingCredentials);
        }

        let builder = self
            .builders
            .find_by_email(&email)
            .await?
            .ok_or(OnboardingError::InvalidCredentials)?;

        match builder.status {
            BuilderStatus::Pending => return Err(OnboardingError::AwaitingApproval),
            BuilderStatus::Rejected => return Err(OnboardingError::AccountRejected),
            BuilderStatus::Approved => {}
        }

        if !auth::password::verify(password.to_string(), builder.password_hash.clone()).await? {
            tracing::debug!(builder_id = %builder.id, "builder password mismatch");
            return Err(OnboardingError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&builder.id.0, &builder.email, Role::Builder)?;
        tracing::info!(builder_id = %builder.id, "builder logged in");
        Ok(BuilderLogin {
            builder: builder.view(),
            token,
        })
    }

    /// Replaces the password of an authenticated builder and clears the temporary flag.
    pub async fn change_password(
        &self,
        builder_id: &BuilderId,
        current: &str,
        new_password: &str,
    ) -> Result<(), OnboardingError> {
        if current.is_empty() || new_password.is_empty() {
            return Err(OnboardingError::MissingCredentials);
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(OnboardingError::WeakPassword);
        }

        let mut builder = self
            .builders
            .fetch(builder_id)
            .await?
            .ok_or(OnboardingError::BuilderNotFound)?;

        if !auth::password::verify(current.to_string(), builder.password_hash.clone()).await? {
            return Err(OnboardingError::InvalidCredentials);
        }

        builder.password_hash =
            auth::password::hash(new_password.to_string(), self.password_cost).await?;
        builder.must_change_password = false;
        builder.updated_at = Utc::now();
        self.builders.update(builder).await?;

        tracing::info!(builder_id = %builder_id, "builder password changed");
        Ok(())
    }

    pub async fn approve(
        &self,
        builder_id: &str,
        admin_name: Option<&str>,
    ) -> Result<DecisionOutcome, OnboardingError> {
        self.approve_at(builder_id, admin_name, Utc::now()).await
    }

    /// Approves a pending builder and mails a freshly issued temporary password.
    pub async fn approve_at(
        &self,
        builder_id: &str,
        admin_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, OnboardingError> {
        let mut builder = self.pending_builder(builder_id).await?;

        let temporary_password = auth::generate_temporary_password();
        builder.password_hash =
            auth::password::hash(temporary_password.clone(), self.password_cost).await?;
        builder.must_change_password = true;
        builder.status = BuilderStatus::Approved;
        builder.approved_by = Some(
            admin_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or("Admin")
                .to_string(),
        );
        builder.approved_at = Some(now);
        builder.updated_at = now;
        self.builders.update(builder.clone()).await?;

        let login_url = format!("{}/auth/builder", self.public_url.trim_end_matches('/'));
        let message = templates::approval_email(
            &builder.email,
            &builder.full_name,
            &temporary_password,
            &login_url,
        );
        let email_delivered = self.deliver_decision(&builder, message).await;

        tracing::info!(builder_id = %builder.id, approved_by = ?builder.approved_by, "builder approved");
        Ok(DecisionOutcome {
            builder: builder.view(),
            email_delivered,
        })
    }

    pub async fn reject(
        &self,
        builder_id: &str,
        reason: Option<&str>,
    ) -> Result<DecisionOutcome, OnboardingError> {
        self.reject_at(builder_id, reason, Utc::now()).await
    }

    pub async fn reject_at(
        &self,
        builder_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, OnboardingError> {
        let mut builder = self.pending_builder(builder_id).await?;

        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(DEFAULT_REJECTION_REASON)
            .to_string();
        builder.status = BuilderStatus::Rejected;
        builder.rejected_at = Some(now);
        builder.rejection_reason = Some(reason.clone());
        builder.updated_at = now;
        self.builders.update(builder.clone()).await?;

        let message = templates::rejection_email(&builder.email, &builder.full_name, Some(&reason));
        let email_delivered = self.deliver_decision(&builder, message).await;

        tracing::info!(builder_id = %builder.id, reason = %reason, "builder rejected");
        Ok(DecisionOutcome {
            builder: builder.view(),
            email_delivered,
        })
    }

    pub async fn pending(&self) -> Result<Vec<BuilderView>, OnboardingError> {
        self.views(BuilderStatus::Pending).await
    }

    pub async fn approved(&self) -> Result<Vec<BuilderView>, OnboardingError> {
        self.views(BuilderStatus::Approved).await
    }

    pub async fn count(&self, status: BuilderStatus) -> Result<usize, OnboardingError> {
        Ok(self.builders.count_by_status(status).await?)
    }

    pub async fn approved_count(&self) -> Result<usize, OnboardingError> {
        self.count(BuilderStatus::Approved).await
    }

    pub async fn overview(&self) -> Result<BuilderOverview, OnboardingError> {
        let builders = self.builders.list_by_status(None).await?;
        let tally = |status: BuilderStatus| {
            builders
                .iter()
                .filter(|builder| builder.status == status)
                .count()
        };

        Ok(BuilderOverview {
            total: builders.len(),
            approved: tally(BuilderStatus::Approved),
            pending: tally(BuilderStatus::Pending),
            rejected: tally(BuilderStatus::Rejected),
            builders: builders.iter().map(Builder::summary).collect(),
        })
    }

    /// Drops expired verification codes; run periodically by the server.
    pub async fn purge_expired_otps(&self, now: DateTime<Utc>) -> Result<usize, OnboardingError> {
        let purged = self.otps.purge_expired(now).await?;
        if purged > 0 {
            tracing::debug!(purged, "expired verification codes removed");
        }
        Ok(purged)
    }

    async fn views(&self, status: BuilderStatus) -> Result<Vec<BuilderView>, OnboardingError> {
        let builders = self.builders.list_by_status(Some(status)).await?;
        Ok(builders.iter().map(Builder::view).collect())
    }

    async fn pending_builder(&self, builder_id: &str) -> Result<Builder, OnboardingError> {
        let builder_id = builder_id.trim();
        if builder_id.is_empty() {
            return Err(OnboardingError::MissingBuilderId);
        }

        let builder = self
            .builders
            .fetch(&BuilderId(builder_id.to_string()))
            .await?
            .ok_or(OnboardingError::BuilderNotFound)?;

        if builder.status != BuilderStatus::Pending {
            return Err(OnboardingError::NotPending);
        }
        Ok(builder)
    }

    async fn deliver_decision(&self, builder: &Builder, message: crate::notify::EmailMessage) -> bool {
        match self.mailer.send(message).await {
            Ok(Delivery::Sent) => true,
            Ok(Delivery::Skipped) => false,
            Err(err) => {
                tracing::warn!(builder_id = %builder.id, error = %err, "decision email failed");
                false
            }
        }
    }
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Email already registered. Please login instead.")]
    AlreadyRegistered,
    #[error("Email and OTP are required")]
    MissingOtpFields,
    #[error("No OTP found. Please request a new one.")]
    OtpNotFound,
    #[error("OTP has expired. Please request a new one.")]
    OtpExpired,
    #[error("Too many failed attempts. Please request a new OTP.")]
    OtpAttemptsExhausted,
    #[error("Invalid OTP. {remaining} attempt(s) remaining.")]
    OtpMismatch { remaining: u8 },
    #[error("All fields are required")]
    MissingSignupFields,
    #[error("Email not verified. Please verify your email first.")]
    EmailNotVerified,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Your account is pending admin approval. Please wait for approval email.")]
    AwaitingApproval,
    #[error("Your account has been rejected. Please contact support.")]
    AccountRejected,
    #[error("Password must be at least 8 characters")]
    WeakPassword,
    #[error("Builder ID is required")]
    MissingBuilderId,
    #[error("Builder not found")]
    BuilderNotFound,
    #[error("Builder is not pending approval")]
    NotPending,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl HttpFailure for OnboardingError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AwaitingApproval | Self::AccountRejected => StatusCode::FORBIDDEN,
            Self::BuilderNotFound => StatusCode::NOT_FOUND,
            Self::Mail(MailError::QuotaExceeded { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::Repository(_) | Self::Password(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Mail(_) => "Failed to send email. Please try again later.".to_string(),
            Self::Repository(_) | Self::Password(_) | Self::Token(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
