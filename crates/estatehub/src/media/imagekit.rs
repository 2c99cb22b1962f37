use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{HostedImage, ImageHost, MediaError, UploadedFile};

const UPLOAD_ENDPOINT: &str = "https://upload.imagekit.io/api/v1/files/upload";
const FILES_ENDPOINT: &str = "https://api.imagekit.io/v1/files";

/// ImageKit client authenticating with the account private key.
#[derive(Clone)]
pub struct ImageKitClient {
    http: reqwest::Client,
    private_key: String,
    upload_endpoint: String,
    files_endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: String,
    url: String,
}

impl ImageKitClient {
    pub fn new(private_key: String) -> Self {
        Self::with_endpoints(
            private_key,
            UPLOAD_ENDPOINT.to_string(),
            FILES_ENDPOINT.to_string(),
        )
    }

    pub fn with_endpoints(private_key: String, upload_endpoint: String, files_endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            private_key,
            upload_endpoint,
            files_endpoint,
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MediaError::Upstream {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ImageHost for ImageKitClient {
    async fn upload(&self, file: UploadedFile, folder: &str) -> Result<HostedImage, MediaError> {
        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("fileName", file.file_name.clone())
            .text("folder", folder.to_string());

        let response = self
            .http
            .post(&self.upload_endpoint)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| MediaError::InvalidResponse(err.to_string()))?;

        tracing::info!(file_name = %file.file_name, size, file_id = %uploaded.file_id, "image uploaded");
        Ok(HostedImage {
            url: uploaded.url,
            file_id: uploaded.file_id,
        })
    }

    async fn delete(&self, file_id: &str) -> Result<(), MediaError> {
        let response = self
            .http
            .delete(format!("{}/{}", self.files_endpoint.trim_end_matches('/'), file_id))
            .basic_auth(&self.private_key, Some(""))
            .send()
            .await?;
        ensure_success(response).await?;
        tracing::debug!(file_id, "image deleted");
        Ok(())
    }
}
