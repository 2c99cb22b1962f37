use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use estatehub::admin::admin_router;
use estatehub::leads::leads_router;
use estatehub::listings::listings_router;
use estatehub::media::media_router;
use estatehub::onboarding::onboarding_router;
use estatehub::storage::StoreHealth;
use serde_json::json;

/// Every API router plus the operational endpoints. Needs an `Extension<AppState>` layer.
pub(crate) fn with_marketplace_routes(services: &Services) -> Router {
    Router::new()
        .merge(onboarding_router(services.onboarding.clone()))
        .merge(admin_router(services.admin_state()))
        .merge(listings_router(
            services.listings.clone(),
            services.tokens.clone(),
        ))
        .merge(leads_router(services.leads.clone(), services.tokens.clone()))
        .merge(media_router(services.images.clone(), services.videos.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready once the listener is bound and the store answers a ping.
pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if !state.readiness.load(std::sync::atomic::Ordering::Relaxed) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        );
    }

    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(err) => {
            tracing::warn!(error = %err, "store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "store unavailable" })),
            )
        }
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
