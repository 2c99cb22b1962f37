use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Property, PropertyDraft};
use super::service::{ListQuery, ListingService};
use crate::auth::{BuilderSession, TokenAuthority, TokenService};
use crate::http::{failure, failure_from, invalid_body, success};

#[derive(Clone)]
pub struct ListingsState {
    pub service: Arc<ListingService>,
    pub tokens: Arc<TokenService>,
}

impl TokenAuthority for ListingsState {
    fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

pub fn listings_router(service: Arc<ListingService>, tokens: Arc<TokenService>) -> Router {
    Router::new()
        .route("/api/properties/list", get(list_handler))
        .route("/api/properties/get", get(get_handler))
        .route("/api/properties/create", post(create_handler))
        .with_state(ListingsState { service, tokens })
}

pub(crate) async fn list_handler(
    State(state): State<ListingsState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match state.service.list(&query).await {
        Ok(properties) => success(json!({
            "properties": properties.iter().map(Property::view).collect::<Vec<_>>(),
        })),
        Err(error) => failure_from(&error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GetQuery {
    id: Option<String>,
}

pub(crate) async fn get_handler(
    State(state): State<ListingsState>,
    Query(query): Query<GetQuery>,
) -> Response {
    match state.service.get(query.id.as_deref()).await {
        Ok(property) => success(json!({ "property": property.view() })),
        Err(error) => failure_from(&error),
    }
}

/// Builders listing while logged in get the property attributed to their account.
pub(crate) async fn create_handler(
    State(state): State<ListingsState>,
    builder: Option<BuilderSession>,
    body: Result<Json<PropertyDraft>, JsonRejection>,
) -> Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let builder_id = builder.map(|BuilderSession(claims)| claims.sub);
    match state.service.create(draft, builder_id).await {
        Ok(property) => success(json!({
            "propertyId": property.id,
            "message": "Property listed successfully!",
        })),
        Err(error) => failure_from(&error),
    }
}
