use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::auth::AdminAuthenticator;
use super::stats;
use crate::auth::{AdminSession, TokenAuthority, TokenService};
use crate::http::{failure_from, invalid_body, success};
use crate::leads::{LeadService, LeadStatus};
use crate::listings::ListingService;
use crate::onboarding::OnboardingService;

#[derive(Clone)]
pub struct AdminState {
    pub authenticator: Arc<AdminAuthenticator>,
    pub onboarding: Arc<OnboardingService>,
    pub leads: Arc<LeadService>,
    pub listings: Arc<ListingService>,
    pub tokens: Arc<TokenService>,
}

impl TokenAuthority for AdminState {
    fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

/// Admin dashboard endpoints. Everything except login requires an admin token.
pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/api/admin/login", post(login_handler))
        .route("/api/admin/pending-builders", get(pending_builders_handler))
        .route("/api/admin/all-builders", get(all_builders_handler))
        .route("/api/admin/builder-overview", get(builder_overview_handler))
        .route("/api/admin/approve-builder", post(approve_builder_handler))
        .route("/api/admin/reject-builder", post(reject_builder_handler))
        .route("/api/admin/delete-property", delete(delete_property_handler))
        .route("/api/admin/leads/export", get(export_leads_handler))
        .route("/api/admin/leads/:lead_id/status", patch(lead_status_handler))
        .route("/api/admin/stats", get(stats_handler))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

pub(crate) async fn login_handler(
    State(state): State<AdminState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match state
        .authenticator
        .login(&state.tokens, &request.email, &request.password)
        .await
    {
        Ok(token) => success(json!({
            "message": "Admin login successful",
            "token": token,
            "admin": { "email": request.email.trim() },
        })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn pending_builders_handler(
    State(state): State<AdminState>,
    _admin: AdminSession,
) -> Response {
    match state.onboarding.pending().await {
        Ok(builders) => success(json!({ "builders": builders })),
        Err(error) => failure_from(&error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AllBuildersQuery {
    details: Option<String>,
}

/// Approved builders: the count by default, the full list with `?details=true`.
pub(crate) async fn all_builders_handler(
    State(state): State<AdminState>,
    _admin: AdminSession,
    Query(query): Query<AllBuildersQuery>,
) -> Response {
    if query.details.as_deref() == Some("true") {
        return match state.onboarding.approved().await {
            Ok(builders) => success(json!({ "builders": builders })),
            Err(error) => failure_from(&error),
        };
    }

    match state.onboarding.approved_count().await {
        Ok(count) => success(json!({ "count": count })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn builder_overview_handler(
    State(state): State<AdminState>,
    _admin: AdminSession,
) -> Response {
    match state.onboarding.overview().await {
        Ok(overview) => success(json!(overview)),
        Err(error) => failure_from(&error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ApproveRequest {
    builder_id: String,
    admin_name: Option<String>,
}

pub(crate) async fn approve_builder_handler(
    State(state): State<AdminState>,
    AdminSession(claims): AdminSession,
    body: Result<Json<ApproveRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let result = state
        .onboarding
        .approve(&request.builder_id, request.admin_name.as_deref())
        .await;
    match result {
        Ok(outcome) => {
            let message = if outcome.email_delivered {
                "Builder approved successfully! Approval email sent."
            } else {
                "Builder approved, but the approval email could not be sent."
            };
            tracing::info!(admin = %claims.email, builder_id = %outcome.builder.id, "approval recorded");
            success(json!({
                "message": message,
                "emailDelivered": outcome.email_delivered,
                "builder": outcome.builder,
            }))
        }
        Err(error) => failure_from(&error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RejectRequest {
    builder_id: String,
    reason: Option<String>,
}

pub(crate) async fn reject_builder_handler(
    State(state): State<AdminState>,
    AdminSession(claims): AdminSession,
    body: Result<Json<RejectRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let result = state
        .onboarding
        .reject(&request.builder_id, request.reason.as_deref())
        .await;
    match result {
        Ok(outcome) => {
            let message = if outcome.email_delivered {
                "Builder rejected. Rejection email sent."
            } else {
                "Builder rejected, but the rejection email could not be sent."
            };
            tracing::info!(admin = %claims.email, builder_id = %outcome.builder.id, "rejection recorded");
            success(json!({
                "message": message,
                "emailDelivered": outcome.email_delivered,
                "builder": outcome.builder,
            }))
        }
        Err(error) => failure_from(&error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DeletePropertyRequest {
    #[serde(deserialize_with = "crate::http::de::optional_id")]
    property_id: Option<String>,
}

pub(crate) async fn delete_property_handler(
    State(state): State<AdminState>,
    _admin: AdminSession,
    body: Result<Json<DeletePropertyRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let property_id = request.property_id.unwrap_or_default();
    match state.listings.delete(&property_id).await {
        Ok(deletion) => success(json!({
            "message": "Property deleted successfully",
            "filesRemoved": deletion.files_removed,
            "filesFailed": deletion.files_failed,
        })),
        Err(error) => failure_from(&error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeadStatusRequest {
    status: LeadStatus,
}

pub(crate) async fn lead_status_handler(
    State(state): State<AdminState>,
    _admin: AdminSession,
    Path(lead_id): Path<String>,
    body: Result<Json<LeadStatusRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match state.leads.update_status(&lead_id, request.status).await {
        Ok(lead) => success(json!({ "lead": lead })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn export_leads_handler(
    State(state): State<AdminState>,
    _admin: AdminSession,
) -> Response {
    match state.leads.export_csv().await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"leads.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn stats_handler(
    State(state): State<AdminState>,
    _admin: AdminSession,
) -> Response {
    match stats::collect(&state.onboarding, &state.leads, &state.listings).await {
        Ok(stats) => success(json!({ "stats": stats })),
        Err(error) => failure_from(&error),
    }
}
