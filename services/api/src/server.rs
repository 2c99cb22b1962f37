use crate::cli::ServeArgs;
use crate::infra::{services_from_config, AppState};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estatehub::config::{AppConfig, AppEnvironment};
use estatehub::error::AppError;
use estatehub::onboarding::OnboardingService;
use estatehub::storage::StoreHealth;
use estatehub::telemetry::{self, LogFormat};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

const OTP_PURGE_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let format = match config.environment {
        AppEnvironment::Production => LogFormat::Json,
        AppEnvironment::Development | AppEnvironment::Test => LogFormat::Compact,
    };
    telemetry::init(&config.telemetry, format)?;
    info!(mail = ?config.mail, media = ?config.media, "configuration loaded");

    let services = services_from_config(&config).await?;
    spawn_otp_purge(services.onboarding.clone());

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store: services.store.clone(),
    };

    let app = with_marketplace_routes(&services)
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "estatehub api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    readiness_flag.store(false, Ordering::Release);
    services.store.close().await;
    info!("estatehub api stopped");
    Ok(())
}

/// Removes expired verification codes once a minute for the life of the process.
fn spawn_otp_purge(onboarding: Arc<OnboardingService>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(OTP_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(err) = onboarding.purge_expired_otps(chrono::Utc::now()).await {
                tracing::warn!(error = %err, "verification code purge failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
