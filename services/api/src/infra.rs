use estatehub::admin::{AdminAuthenticator, AdminState};
use estatehub::auth::TokenService;
use estatehub::config::AppConfig;
use estatehub::error::AppError;
use estatehub::leads::{LeadRepository, LeadService};
use estatehub::listings::{ListingService, PropertyRepository};
use estatehub::media::{self, ImageHost, VideoHost};
use estatehub::notify::{self, Mailer};
use estatehub::onboarding::{BuilderRepository, OnboardingService, OtpRepository};
use estatehub::storage::{MemoryStore, StoreHealth};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<dyn StoreHealth>,
}

/// Everything the routers need, wired against one store.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) store: Arc<dyn StoreHealth>,
    pub(crate) tokens: Arc<TokenService>,
    pub(crate) onboarding: Arc<OnboardingService>,
    pub(crate) leads: Arc<LeadService>,
    pub(crate) listings: Arc<ListingService>,
    pub(crate) images: Arc<dyn ImageHost>,
    pub(crate) videos: Arc<dyn VideoHost>,
    pub(crate) authenticator: Arc<AdminAuthenticator>,
}

impl Services {
    pub(crate) fn admin_state(&self) -> AdminState {
        AdminState {
            authenticator: self.authenticator.clone(),
            onboarding: self.onboarding.clone(),
            leads: self.leads.clone(),
            listings: self.listings.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

/// Store types that back every repository.
pub(crate) trait MarketplaceStore:
    BuilderRepository + OtpRepository + LeadRepository + PropertyRepository + StoreHealth + 'static
{
}

impl<T> MarketplaceStore for T where
    T: BuilderRepository
        + OtpRepository
        + LeadRepository
        + PropertyRepository
        + StoreHealth
        + 'static,
{
}

pub(crate) fn wire<S: MarketplaceStore>(
    store: Arc<S>,
    mailer: Arc<dyn Mailer>,
    images: Arc<dyn ImageHost>,
    videos: Arc<dyn VideoHost>,
    config: &AppConfig,
) -> Services {
    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_hours,
    ));

    let onboarding = OnboardingService::new(
        store.clone(),
        store.clone(),
        mailer.clone(),
        tokens.clone(),
        config.public_url.clone(),
    );
    let leads = LeadService::new(store.clone(), mailer, config.mail.enquiry_recipient.clone());
    let listings = ListingService::new(store.clone(), images.clone());

    Services {
        store,
        tokens,
        onboarding: Arc::new(onboarding),
        leads: Arc::new(leads),
        listings: Arc::new(listings),
        images,
        videos,
        authenticator: Arc::new(AdminAuthenticator::from_config(&config.auth)),
    }
}

/// Integrations from configuration, backed by SQLite when `DATABASE_URL` is set and the
/// `database` feature is compiled in, otherwise by the in-memory store.
pub(crate) async fn services_from_config(config: &AppConfig) -> Result<Services, AppError> {
    let mailer = notify::mailer_from_config(&config.mail);
    let images = media::image_host_from_config(&config.media);
    let videos = media::video_host_from_config(&config.media);

    match config.storage.database_url.as_deref() {
        #[cfg(feature = "database")]
        Some(url) => {
            let store = estatehub::storage::SqliteStore::connect(url).await?;
            tracing::info!("using sqlite store");
            Ok(wire(Arc::new(store), mailer, images, videos, config))
        }
        #[cfg(not(feature = "database"))]
        Some(_) => {
            tracing::warn!("DATABASE_URL is set but the `database` feature is disabled; data will not persist");
            Ok(wire(Arc::new(MemoryStore::new()), mailer, images, videos, config))
        }
        None => {
            tracing::warn!("DATABASE_URL unset; using the in-memory store");
            Ok(wire(Arc::new(MemoryStore::new()), mailer, images, videos, config))
        }
    }
}
