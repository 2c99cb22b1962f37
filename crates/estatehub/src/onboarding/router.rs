use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{BuilderId, SignupForm};
use super::service::OnboardingService;
use crate::auth::{BuilderSession, TokenAuthority, TokenService};
use crate::http::{failure_from, invalid_body, success};
use crate::notify::Delivery;

impl TokenAuthority for OnboardingService {
    fn tokens(&self) -> &TokenService {
        self.token_service()
    }
}

/// Builder-facing registration and login endpoints.
pub fn onboarding_router(service: Arc<OnboardingService>) -> Router {
    Router::new()
        .route("/api/auth/send-otp", post(send_otp_handler))
        .route("/api/auth/verify-otp", post(verify_otp_handler))
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/change-password", post(change_password_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SendOtpRequest {
    email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VerifyOtpRequest {
    email: String,
    otp: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

pub(crate) async fn send_otp_handler(
    State(service): State<Arc<OnboardingService>>,
    body: Result<Json<SendOtpRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match service.send_otp(&request.email).await {
        Ok(Delivery::Sent) => success(json!({
            "message": "OTP sent successfully! Please check your email.",
        })),
        Ok(Delivery::Skipped) => success(json!({
            "message": "OTP created, but email delivery is not configured.",
            "emailDelivered": false,
        })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn verify_otp_handler(
    State(service): State<Arc<OnboardingService>>,
    body: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match service.verify_otp(&request.email, &request.otp).await {
        Ok(()) => success(json!({ "message": "Email verified successfully!" })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn signup_handler(
    State(service): State<Arc<OnboardingService>>,
    body: Result<Json<SignupForm>, JsonRejection>,
) -> Response {
    let Json(form) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match service.signup(form).await {
        Ok(builder_id) => success(json!({
            "message": "Registration successful! Your account is pending admin approval.",
            "builderId": builder_id,
        })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn login_handler(
    State(service): State<Arc<OnboardingService>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match service.login(&request.email, &request.password).await {
        Ok(login) => success(json!({
            "message": "Login successful!",
            "builder": login.builder,
            "token": login.token,
        })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn change_password_handler(
    State(service): State<Arc<OnboardingService>>,
    BuilderSession(claims): BuilderSession,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let builder_id = BuilderId(claims.sub);
    match service
        .change_password(&builder_id, &request.current_password, &request.new_password)
        .await
    {
        Ok(()) => success(json!({ "message": "Password updated successfully" })),
        Err(error) => failure_from(&error),
    }
}
