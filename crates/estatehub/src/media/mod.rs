//! Upload proxying to the hosted image and video providers.

pub mod imagekit;
pub mod router;
pub mod youtube;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::MediaConfig;
use crate::http::HttpFailure;

pub use imagekit::ImageKitClient;
pub use router::{media_router, MediaState};
pub use youtube::YouTubeClient;

/// File received from a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Content type from the form part, falling back to the file extension.
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedImage {
    pub url: String,
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedVideo {
    pub video_id: String,
    pub url: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, file: UploadedFile, folder: &str) -> Result<HostedImage, MediaError>;
    async fn delete(&self, file_id: &str) -> Result<(), MediaError>;
}

#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Uploads as an unlisted, embeddable video.
    async fn upload(&self, file: UploadedFile, title: &str) -> Result<HostedVideo, MediaError>;
    async fn make_embeddable(&self, video_id: &str) -> Result<(), MediaError>;
}

/// Placeholder host used when provider credentials are absent.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured(pub &'static str);

#[async_trait]
impl ImageHost for Unconfigured {
    async fn upload(&self, _file: UploadedFile, _folder: &str) -> Result<HostedImage, MediaError> {
        Err(MediaError::NotConfigured { provider: self.0 })
    }

    async fn delete(&self, _file_id: &str) -> Result<(), MediaError> {
        Err(MediaError::NotConfigured { provider: self.0 })
    }
}

#[async_trait]
impl VideoHost for Unconfigured {
    async fn upload(&self, _file: UploadedFile, _title: &str) -> Result<HostedVideo, MediaError> {
        Err(MediaError::NotConfigured { provider: self.0 })
    }

    async fn make_embeddable(&self, _video_id: &str) -> Result<(), MediaError> {
        Err(MediaError::NotConfigured { provider: self.0 })
    }
}

pub fn image_host_from_config(config: &MediaConfig) -> Arc<dyn ImageHost> {
    match &config.imagekit_private_key {
        Some(key) => Arc::new(ImageKitClient::new(key.clone())),
        None => {
            tracing::warn!("IMAGEKIT_PRIVATE_KEY unset; image uploads are disabled");
            Arc::new(Unconfigured("ImageKit"))
        }
    }
}

pub fn video_host_from_config(config: &MediaConfig) -> Arc<dyn VideoHost> {
    match &config.youtube {
        Some(credentials) => Arc::new(YouTubeClient::new(credentials.clone())),
        None => {
            tracing::warn!("YouTube credentials unset; video uploads are disabled");
            Arc::new(Unconfigured("YouTube"))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{provider} is not configured")]
    NotConfigured { provider: &'static str },
    #[error("No file provided")]
    MissingFile,
    #[error("Video ID is required")]
    MissingVideoId,
    #[error("invalid upload form: {0}")]
    Form(String),
    #[error("YouTube authentication failed. Please re-authorize the app.")]
    Auth(String),
    #[error("media provider returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("media provider response was not understood: {0}")]
    InvalidResponse(String),
    #[error("media transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl HttpFailure for MediaError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::MissingFile | Self::MissingVideoId | Self::Form(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) | Self::Upstream { .. } | Self::InvalidResponse(_) | Self::Transport(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Upstream { .. } | Self::InvalidResponse(_) | Self::Transport(_) => {
                "Upload provider request failed".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_falls_back_to_extension() {
        let file = UploadedFile::new("tower.jpg", None, vec![1, 2, 3]);
        assert_eq!(file.content_type, "image/jpeg");

        let file = UploadedFile::new("walkthrough.bin", Some("video/mp4".to_string()), Vec::new());
        assert_eq!(file.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn unconfigured_hosts_report_service_unavailable() {
        let host = Unconfigured("ImageKit");
        let err = ImageHost::delete(&host, "file-1")
            .await
            .expect_err("not configured");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.public_message(), "ImageKit is not configured");
    }
}
