use crate::auth::PasswordError;
use crate::config::ConfigError;
use crate::http::failure;
use crate::storage::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Failures raised while bootstrapping or running the service binary.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Storage(RepositoryError),
    Password(PasswordError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Password(err) => write!(f, "password error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Password(err) => Some(err),
        }
    }
}

/// Missing and duplicate records are reported as such; every other failure stays opaque.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Storage(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Storage(RepositoryError::Conflict) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Storage(_)
            | AppError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            failure(status, "Internal server error")
        } else {
            failure(status, self.to_string())
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<PasswordError> for AppError {
    fn from(value: PasswordError) -> Self {
        Self::Password(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_use_failure_envelope() {
        let response =
            AppError::Storage(RepositoryError::Unavailable("pool closed".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error"], "Internal server error");
    }

    #[tokio::test]
    async fn missing_and_duplicate_records_name_themselves() {
        for (err, status, message) in [
            (
                RepositoryError::NotFound,
                StatusCode::NOT_FOUND,
                "storage error: record not found",
            ),
            (
                RepositoryError::Conflict,
                StatusCode::CONFLICT,
                "storage error: record already exists",
            ),
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);

            let body = axum::body::to_bytes(response.into_body(), 1024)
                .await
                .expect("read body");
            let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
            assert_eq!(payload["error"], message);
        }
    }

    #[test]
    fn display_names_the_layer() {
        let err = AppError::from(ConfigError::Missing { key: "JWT_SECRET" });
        assert_eq!(
            err.to_string(),
            "configuration error: JWT_SECRET must be set in production"
        );
    }
}
