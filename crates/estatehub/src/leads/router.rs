use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{Enquiry, LeadForm};
use super::service::LeadService;
use crate::auth::{AdminSession, TokenAuthority, TokenService};
use crate::http::{failure_from, invalid_body, success};
use crate::notify::Delivery;

#[derive(Clone)]
pub struct LeadsState {
    pub service: Arc<LeadService>,
    pub tokens: Arc<TokenService>,
}

impl TokenAuthority for LeadsState {
    fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

/// Public enquiry intake plus the admin lead listing.
pub fn leads_router(service: Arc<LeadService>, tokens: Arc<TokenService>) -> Router {
    Router::new()
        .route("/api/leads", get(list_handler).post(capture_handler))
        .route("/api/send-enquiry", post(enquiry_handler))
        .with_state(LeadsState { service, tokens })
}

pub(crate) async fn list_handler(
    State(state): State<LeadsState>,
    _admin: AdminSession,
) -> Response {
    match state.service.recent().await {
        Ok(leads) => success(json!({ "leads": leads })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn capture_handler(
    State(state): State<LeadsState>,
    body: Result<Json<LeadForm>, JsonRejection>,
) -> Response {
    let Json(form) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match state.service.capture(form).await {
        Ok(lead) => success(json!({
            "message": "Enquiry submitted successfully!",
            "leadId": lead.id,
        })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn enquiry_handler(
    State(state): State<LeadsState>,
    body: Result<Json<Enquiry>, JsonRejection>,
) -> Response {
    let Json(enquiry) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match state.service.forward_enquiry(enquiry).await {
        Ok(Delivery::Sent) => success(json!({ "message": "Enquiry sent" })),
        Ok(Delivery::Skipped) => success(json!({ "message": "Email delivery not configured" })),
        Err(error) => failure_from(&error),
    }
}
