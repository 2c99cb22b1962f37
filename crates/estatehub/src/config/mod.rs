use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEV_JWT_SECRET: &str = "estatehub-development-secret";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub public_url: String,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub media: MediaConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let public_url = env::var("APP_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let jwt_secret = match optional("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::Missing { key: "JWT_SECRET" })
            }
            None => DEV_JWT_SECRET.to_string(),
        };

        let auth = AuthConfig {
            jwt_secret,
            token_ttl_hours: numeric("JWT_TTL_HOURS", 168)?,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        };

        let mail = MailConfig {
            sendgrid_api_key: optional("SENDGRID_API_KEY"),
            from_address: optional("MAIL_FROM"),
            enquiry_recipient: optional("ENQUIRY_RECIPIENT")
                .unwrap_or_else(|| "info@estatehub.com".to_string()),
            daily_limit: numeric("MAIL_DAILY_LIMIT", 500)?,
            min_interval_ms: numeric("MAIL_MIN_INTERVAL_MS", 500)?,
        };

        let media = MediaConfig {
            imagekit_private_key: optional("IMAGEKIT_PRIVATE_KEY"),
            youtube: match (
                optional("YOUTUBE_CLIENT_ID"),
                optional("YOUTUBE_CLIENT_SECRET"),
                optional("YOUTUBE_REFRESH_TOKEN"),
            ) {
                (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                    Some(YouTubeCredentials {
                        client_id,
                        client_secret,
                        refresh_token,
                    })
                }
                _ => None,
            },
        };

        Ok(Self {
            environment,
            public_url,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth,
            mail,
            media,
            storage: StorageConfig {
                database_url: optional("DATABASE_URL"),
            },
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn numeric<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber { key }),
        None => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Token signing and admin credential settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

/// Outbound email settings. A missing API key selects the log-only mailer.
#[derive(Clone)]
pub struct MailConfig {
    pub sendgrid_api_key: Option<String>,
    pub from_address: Option<String>,
    pub enquiry_recipient: String,
    pub daily_limit: u32,
    pub min_interval_ms: u64,
}

impl MailConfig {
    pub fn is_configured(&self) -> bool {
        self.sendgrid_api_key.is_some() && self.from_address.is_some()
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("configured", &self.is_configured())
            .field("from_address", &self.from_address)
            .field("enquiry_recipient", &self.enquiry_recipient)
            .field("daily_limit", &self.daily_limit)
            .field("min_interval_ms", &self.min_interval_ms)
            .finish()
    }
}

/// Credentials for the hosted image and video providers.
#[derive(Clone, Default)]
pub struct MediaConfig {
    pub imagekit_private_key: Option<String>,
    pub youtube: Option<YouTubeCredentials>,
}

impl fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaConfig")
            .field("imagekit", &self.imagekit_private_key.is_some())
            .field("youtube", &self.youtube.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct YouTubeCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub database_url: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    Missing { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => write!(f, "{key} must be a number"),
            ConfigError::Missing { key } => write!(f, "{key} must be set in production"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::Missing { .. } => None,
        }
    }
}
