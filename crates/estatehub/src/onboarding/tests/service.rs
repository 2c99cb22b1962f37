use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Duration;

use super::common::*;
use crate::auth::{Role, TokenService};
use crate::http::HttpFailure;
use crate::notify::LogMailer;
use crate::onboarding::{
    BuilderRepository, BuilderStatus, OnboardingError, OnboardingService,
    OtpRepository, DEFAULT_REJECTION_REASON,
};

#[tokio::test]
async fn send_otp_rejects_malformed_email() {
    let harness = harness();
    for email in ["", "builder", "builder@acme", "bad email@acme.in"] {
        let err = harness
            .service
            .send_otp_at(email, now())
            .await
            .expect_err("invalid email rejected");
        assert!(matches!(err, OnboardingError::InvalidEmail), "{email}: {err}");
    }
    assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn send_otp_normalizes_and_replaces_previous_codes() {
    let harness = harness();
    harness
        .service
        .send_otp_at("  Builder@ACME.in ", now())
        .await
        .expect("first code");
    let first = stored_code(&harness.store, EMAIL).await;
    harness
        .service
        .send_otp_at(EMAIL, now() + Duration::seconds(30))
        .await
        .expect("second code");

    assert_eq!(harness.store.delete_for_email(EMAIL).await.expect("count"), 1);
    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, EMAIL);
    assert!(sent[0].html.contains(&first));
    assert_eq!(first.len(), 6);
}

#[tokio::test]
async fn send_otp_refuses_registered_email() {
    let harness = harness();
    register(&harness).await;

    let err = harness
        .service
        .send_otp_at(EMAIL, now())
        .await
        .expect_err("already registered");
    assert_eq!(
        err.to_string(),
        "Email already registered. Please login instead."
    );
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_otp_counts_down_attempts_then_locks() {
    let harness = harness();
    harness
        .service
        .send_otp_at(EMAIL, now())
        .await
        .expect("code sent");
    let code = stored_code(&harness.store, EMAIL).await;
    let wrong = if code == "111111" { "222222" } else { "111111" };

    for remaining in [2u8, 1, 0] {
        let err = harness
            .service
            .verify_otp_at(EMAIL, wrong, now())
            .await
            .expect_err("mismatch");
        assert_eq!(err.to_string(), format!("Invalid OTP. {remaining} attempt(s) remaining."));
    }

    let err = harness
        .service
        .verify_otp_at(EMAIL, &code, now())
        .await
        .expect_err("exhausted");
    assert!(matches!(err, OnboardingError::OtpAttemptsExhausted));

    let err = harness
        .service
        .verify_otp_at(EMAIL, &code, now())
        .await
        .expect_err("record deleted");
    assert!(matches!(err, OnboardingError::OtpNotFound));
}

#[tokio::test]
async fn verify_otp_expires_after_five_minutes() {
    let harness = harness();
    harness
        .service
        .send_otp_at(EMAIL, now())
        .await
        .expect("code sent");
    let code = stored_code(&harness.store, EMAIL).await;

    let err = harness
        .service
        .verify_otp_at(EMAIL, &code, now() + Duration::minutes(6))
        .await
        .expect_err("expired");
    assert_eq!(err.to_string(), "OTP has expired. Please request a new one.");
    assert!(harness
        .store
        .latest(EMAIL, false)
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn verify_otp_requires_both_fields() {
    let harness = harness();
    let err = harness
        .service
        .verify_otp_at(EMAIL, " ", now())
        .await
        .expect_err("missing code");
    assert_eq!(err.to_string(), "Email and OTP are required");
}

#[tokio::test]
async fn signup_requires_every_field_and_verification() {
    let harness = harness();

    let mut incomplete = signup_form();
    incomplete.gst_number = "  ".to_string();
    let err = harness
        .service
        .signup_at(incomplete, now())
        .await
        .expect_err("missing gst");
    assert_eq!(err.to_string(), "All fields are required");

    let err = harness
        .service
        .signup_at(signup_form(), now())
        .await
        .expect_err("not verified");
    assert!(matches!(err, OnboardingError::EmailNotVerified));
}

#[tokio::test]
async fn signup_rejects_verification_older_than_code_lifetime() {
    let harness = harness();
    harness
        .service
        .send_otp_at(EMAIL, now())
        .await
        .expect("code sent");
    let code = stored_code(&harness.store, EMAIL).await;
    harness
        .service
        .verify_otp_at(EMAIL, &code, now())
        .await
        .expect("verified");

    let err = harness
        .service
        .signup_at(signup_form(), now() + Duration::minutes(10))
        .await
        .expect_err("stale verification");
    assert!(matches!(err, OnboardingError::EmailNotVerified));
}

#[tokio::test]
async fn signup_stores_pending_builder_and_clears_codes() {
    let harness = harness();
    let builder_id = register(&harness).await;

    let builder = harness
        .store
        .find_by_email(EMAIL)
        .await
        .expect("query")
        .expect("builder stored");
    assert_eq!(builder.id, builder_id);
    assert_eq!(builder.status, BuilderStatus::Pending);
    assert!(builder.email_verified);
    assert!(builder.password_hash.starts_with("$2"));
    assert_ne!(builder.password_hash, PASSWORD);
    assert!(harness
        .store
        .latest(EMAIL, true)
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn login_is_gated_on_approval() {
    let harness = harness();
    let builder_id = register(&harness).await;

    let err = harness
        .service
        .login(EMAIL, PASSWORD)
        .await
        .expect_err("pending");
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

    let mut builder = harness
        .store
        .fetch(&builder_id)
        .await
        .expect("query")
        .expect("builder");
    builder.status = BuilderStatus::Rejected;
    BuilderRepository::update(harness.store.as_ref(), builder)
        .await
        .expect("update");

    let err = harness
        .service
        .login(EMAIL, PASSWORD)
        .await
        .expect_err("rejected");
    assert_eq!(
        err.to_string(),
        "Your account has been rejected. Please contact support."
    );

    let err = harness
        .service
        .login("nobody@acme.in", PASSWORD)
        .await
        .expect_err("unknown");
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn approval_issues_working_temporary_password() {
    let harness = harness();
    let builder_id = register(&harness).await;

    let outcome = harness
        .service
        .approve_at(&builder_id.0, Some("Priya"), now())
        .await
        .expect("approved");
    assert!(outcome.email_delivered);
    assert_eq!(outcome.builder.status, BuilderStatus::Approved);
    assert_eq!(outcome.builder.approved_by.as_deref(), Some("Priya"));
    assert!(outcome.builder.must_change_password);

    let email = harness.mailer.last();
    assert!(email.html.contains("https://estatehub.example/auth/builder"));
    let temporary = temporary_password(&email);

    let err = harness
        .service
        .login(EMAIL, PASSWORD)
        .await
        .expect_err("original password replaced");
    assert!(matches!(err, OnboardingError::InvalidCredentials));

    let login = harness
        .service
        .login(EMAIL, &temporary)
        .await
        .expect("temporary password works");
    let claims = harness.tokens.verify(&login.token).expect("token verifies");
    assert_eq!(claims.role, Role::Builder);
    assert_eq!(claims.sub, builder_id.0);
    assert!(login.builder.must_change_password);
}

#[tokio::test]
async fn change_password_clears_temporary_flag() {
    let harness = harness();
    let builder_id = register(&harness).await;
    harness
        .service
        .approve_at(&builder_id.0, None, now())
        .await
        .expect("approved");
    let temporary = temporary_password(&harness.mailer.last());

    let err = harness
        .service
        .change_password(&builder_id, &temporary, "short")
        .await
        .expect_err("too short");
    assert!(matches!(err, OnboardingError::WeakPassword));

    let err = harness
        .service
        .change_password(&builder_id, "not-it", "a-much-longer-one")
        .await
        .expect_err("wrong current password");
    assert!(matches!(err, OnboardingError::InvalidCredentials));

    harness
        .service
        .change_password(&builder_id, &temporary, "a-much-longer-one")
        .await
        .expect("changed");
    let login = harness
        .service
        .login(EMAIL, "a-much-longer-one")
        .await
        .expect("new password works");
    assert!(!login.builder.must_change_password);
}

#[tokio::test]
async fn decisions_require_pending_builder() {
    let harness = harness();

    let err = harness
        .service
        .approve_at("  ", None, now())
        .await
        .expect_err("missing id");
    assert_eq!(err.to_string(), "Builder ID is required");

    let err = harness
        .service
        .reject_at("missing", None, now())
        .await
        .expect_err("unknown id");
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

    let builder_id = register(&harness).await;
    harness
        .service
        .approve_at(&builder_id.0, None, now())
        .await
        .expect("approved");
    let err = harness
        .service
        .reject_at(&builder_id.0, None, now())
        .await
        .expect_err("already decided");
    assert_eq!(err.to_string(), "Builder is not pending approval");
}

#[tokio::test]
async fn rejection_defaults_reason_and_notifies() {
    let harness = harness();
    let builder_id = register(&harness).await;

    let outcome = harness
        .service
        .reject_at(&builder_id.0, Some("   "), now())
        .await
        .expect("rejected");
    assert_eq!(outcome.builder.status, BuilderStatus::Rejected);
    assert_eq!(
        outcome.builder.rejection_reason.as_deref(),
        Some(DEFAULT_REJECTION_REASON)
    );
    assert_eq!(outcome.builder.rejected_at, Some(now()));
    assert!(harness.mailer.last().html.contains(DEFAULT_REJECTION_REASON));
}

#[tokio::test]
async fn approval_persists_when_email_fails() {
    let harness = harness();
    let builder_id = register(&harness).await;

    let failing = OnboardingService::new(
        harness.store.clone(),
        harness.store.clone(),
        Arc::new(RecordingMailer::failing()),
        harness.tokens.clone(),
        "https://estatehub.example",
    )
    .with_password_cost(4);

    let outcome = failing
        .approve_at(&builder_id.0, None, now())
        .await
        .expect("approval stored");
    assert!(!outcome.email_delivered);
    let stored = harness
        .store
        .fetch(&builder_id)
        .await
        .expect("query")
        .expect("builder");
    assert_eq!(stored.status, BuilderStatus::Approved);
    assert_eq!(stored.approved_by.as_deref(), Some("Admin"));
}

#[tokio::test]
async fn send_otp_surfaces_mail_failures_as_bad_gateway() {
    let harness = harness_with_mailer(RecordingMailer::failing());
    let err = harness
        .service
        .send_otp_at(EMAIL, now())
        .await
        .expect_err("mail failed");
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        err.public_message(),
        "Failed to send email. Please try again later."
    );
}

#[tokio::test]
async fn overview_tallies_statuses() {
    let harness = harness();
    let builder_id = register(&harness).await;
    harness
        .service
        .approve_at(&builder_id.0, None, now())
        .await
        .expect("approved");

    let overview = harness.service.overview().await.expect("overview");
    assert_eq!(overview.total, 1);
    assert_eq!(overview.approved, 1);
    assert_eq!(overview.pending, 0);
    assert_eq!(overview.builders[0].company, "Acme Developers");
    assert_eq!(harness.service.approved_count().await.expect("count"), 1);
    assert!(harness.service.pending().await.expect("pending").is_empty());
}

#[tokio::test]
async fn purge_removes_expired_codes() {
    let harness = harness();
    harness
        .service
        .send_otp_at(EMAIL, now())
        .await
        .expect("code sent");

    let purged = harness
        .service
        .purge_expired_otps(now() + Duration::minutes(1))
        .await
        .expect("purge");
    assert_eq!(purged, 0);
    let purged = harness
        .service
        .purge_expired_otps(now() + Duration::minutes(6))
        .await
        .expect("purge");
    assert_eq!(purged, 1);
}

#[tokio::test]
async fn repository_outage_is_hidden_from_clients() {
    let store = Arc::new(UnavailableStore);
    let service = OnboardingService::new(
        store.clone(),
        store,
        Arc::new(LogMailer),
        Arc::new(TokenService::new("secret", 1)),
        "https://estatehub.example",
    );

    let err = service
        .login(EMAIL, PASSWORD)
        .await
        .expect_err("store offline");
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.public_message(), "Internal server error");

    let err = service
        .approve("b-1", None)
        .await
        .expect_err("store offline");
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}
