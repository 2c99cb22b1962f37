use axum::http::StatusCode;

use crate::auth::throttle::minutes_remaining;
use crate::auth::{password, LoginThrottle, PasswordError, Role, TokenError, TokenService};
use crate::config::AuthConfig;
use crate::http::HttpFailure;
use crate::leads::LeadError;
use crate::listings::ListingError;
use crate::onboarding::OnboardingError;

/// Checks the single configured admin account and issues admin tokens.
pub struct AdminAuthenticator {
    email: Option<String>,
    password: Option<String>,
    throttle: LoginThrottle,
}

impl AdminAuthenticator {
    pub fn new(email: Option<String>, password: Option<String>, throttle: LoginThrottle) -> Self {
        Self {
            email,
            password,
            throttle,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.admin_email.clone(),
            config.admin_password.clone(),
            LoginThrottle::admin_default(),
        )
    }

    /// Attempts are counted per submitted email before the credentials are checked.
    pub async fn login(
        &self,
        tokens: &TokenService,
        email: &str,
        plain: &str,
    ) -> Result<String, AdminError> {
        let email = email.trim();
        if email.is_empty() || plain.is_empty() {
            return Err(AdminError::MissingCredentials);
        }

        if let Err(wait) = self.throttle.check(&format!("admin_{email}")) {
            tracing::warn!(email = %email, wait_secs = wait.as_secs(), "admin login throttled");
            return Err(AdminError::Throttled {
                minutes: minutes_remaining(wait),
            });
        }

        let (Some(admin_email), Some(admin_password)) = (&self.email, &self.password) else {
            return Err(AdminError::NotConfigured);
        };

        if email != admin_email.as_str() {
            return Err(AdminError::InvalidCredentials);
        }
        if !password::verify(plain.to_string(), admin_password.clone()).await? {
            tracing::warn!(email = %email, "admin password mismatch");
            return Err(AdminError::InvalidCredentials);
        }

        let token = tokens.issue("admin", admin_email, Role::Admin)?;
        tracing::info!(email = %email, "admin logged in");
        Ok(token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Too many login attempts. Try again in {minutes} minutes.")]
    Throttled { minutes: u64 },
    #[error("Admin credentials not configured")]
    NotConfigured,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Onboarding(#[from] OnboardingError),
    #[error(transparent)]
    Leads(#[from] LeadError),
    #[error(transparent)]
    Listings(#[from] ListingError),
}

impl HttpFailure for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredentials => StatusCode::BAD_REQUEST,
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotConfigured | Self::Password(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Onboarding(err) => err.status_code(),
            Self::Leads(err) => err.status_code(),
            Self::Listings(err) => err.status_code(),
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Password(_) | Self::Token(_) => "Login failed".to_string(),
            Self::Onboarding(err) => err.public_message(),
            Self::Leads(err) => err.public_message(),
            Self::Listings(err) => err.public_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;
    use std::time::Duration;

    fn tokens() -> TokenService {
        TokenService::new("admin-secret", 1)
    }

    fn authenticator(password: &str) -> AdminAuthenticator {
        AdminAuthenticator::new(
            Some("admin@estatehub.com".to_string()),
            Some(password.to_string()),
            LoginThrottle::admin_default(),
        )
    }

    #[tokio::test]
    async fn plain_and_hashed_passwords_are_accepted() {
        let tokens = tokens();
        let token = authenticator("letmein")
            .login(&tokens, "admin@estatehub.com", "letmein")
            .await
            .expect("plain password accepted");
        let claims = tokens.verify(&token).expect("token verifies");
        assert_eq!(claims.role, Role::Admin);

        let hashed = password::hash_blocking("letmein", 4).expect("hash");
        authenticator(&hashed)
            .login(&tokens, "admin@estatehub.com", "letmein")
            .await
            .expect("bcrypt password accepted");
    }

    #[tokio::test]
    async fn wrong_email_or_password_is_unauthorized() {
        let tokens = tokens();
        let auth = authenticator("letmein");
        let err = auth
            .login(&tokens, "someone@estatehub.com", "letmein")
            .await
            .expect_err("wrong email");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = auth
            .login(&tokens, "admin@estatehub.com", "guess")
            .await
            .expect_err("wrong password");
        assert_eq!(err.public_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn missing_configuration_is_server_error() {
        let auth = AdminAuthenticator::new(None, None, LoginThrottle::admin_default());
        let err = auth
            .login(&tokens(), "admin@estatehub.com", "letmein")
            .await
            .expect_err("not configured");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Admin credentials not configured");
    }

    #[tokio::test]
    async fn sixth_attempt_is_throttled() {
        let tokens = tokens();
        let auth = authenticator("letmein");
        for _ in 0..5 {
            let _ = auth.login(&tokens, "admin@estatehub.com", "guess").await;
        }
        let err = auth
            .login(&tokens, "admin@estatehub.com", "letmein")
            .await
            .expect_err("throttled");
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert!(err
            .public_message()
            .starts_with("Too many login attempts. Try again in"));

        let other = AdminAuthenticator::new(
            Some("admin@estatehub.com".to_string()),
            Some("letmein".to_string()),
            LoginThrottle::new(NonZeroU32::MIN, Duration::from_secs(60)),
        );
        other
            .login(&tokens, "admin@estatehub.com", "letmein")
            .await
            .expect("first attempt allowed");
    }
}
