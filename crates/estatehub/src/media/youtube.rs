use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use serde_json::json;

use super::{HostedVideo, MediaError, UploadedFile, VideoHost};
use crate::config::YouTubeCredentials;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";
const VIDEO_DESCRIPTION: &str = "Property video uploaded via EstateHub";

#[derive(Debug, Clone)]
pub struct YouTubeEndpoints {
    pub token: String,
    pub upload: String,
    pub videos: String,
}

impl Default for YouTubeEndpoints {
    fn default() -> Self {
        Self {
            token: TOKEN_ENDPOINT.to_string(),
            upload: UPLOAD_ENDPOINT.to_string(),
            videos: VIDEOS_ENDPOINT.to_string(),
        }
    }
}

/// YouTube Data API client using a long-lived refresh token.
///
/// A fresh access token is requested for every upload.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    credentials: YouTubeCredentials,
    endpoints: YouTubeEndpoints,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct VideoResource {
    id: String,
}

impl YouTubeClient {
    pub fn new(credentials: YouTubeCredentials) -> Self {
        Self::with_endpoints(credentials, YouTubeEndpoints::default())
    }

    pub fn with_endpoints(credentials: YouTubeCredentials, endpoints: YouTubeEndpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            endpoints,
        }
    }

    async fn access_token(&self) -> Result<String, MediaError> {
        let response = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "youtube token refresh failed");
            return Err(MediaError::Auth(body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| MediaError::Auth(err.to_string()))?;
        Ok(token.access_token)
    }
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

async fn upstream(response: reqwest::Response) -> MediaError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    MediaError::Upstream { status, body }
}

#[async_trait]
impl VideoHost for YouTubeClient {
    async fn upload(&self, file: UploadedFile, title: &str) -> Result<HostedVideo, MediaError> {
        let access_token = self.access_token().await?;
        let metadata = json!({
            "snippet": {
                "title": title,
                "description": VIDEO_DESCRIPTION,
            },
            "status": {
                "privacyStatus": "unlisted",
                "embeddable": true,
                "selfDeclaredMadeForKids": false,
            },
        });

        let session = self
            .http
            .post(&self.endpoints.upload)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&access_token)
            .header("X-Upload-Content-Type", &file.content_type)
            .header("X-Upload-Content-Length", file.bytes.len().to_string())
            .json(&metadata)
            .send()
            .await?;
        if !session.status().is_success() {
            return Err(upstream(session).await);
        }

        let location = session
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| MediaError::InvalidResponse("missing resumable upload location".to_string()))?;

        let size = file.bytes.len();
        let response = self
            .http
            .put(location)
            .bearer_auth(&access_token)
            .header(CONTENT_TYPE, &file.content_type)
            .body(file.bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(upstream(response).await);
        }

        let video: VideoResource = response
            .json()
            .await
            .map_err(|err| MediaError::InvalidResponse(err.to_string()))?;

        tracing::info!(file_name = %file.file_name, size, video_id = %video.id, "video uploaded");
        Ok(HostedVideo {
            url: watch_url(&video.id),
            video_id: video.id,
        })
    }

    async fn make_embeddable(&self, video_id: &str) -> Result<(), MediaError> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return Err(MediaError::MissingVideoId);
        }

        let access_token = self.access_token().await?;
        let response = self
            .http
            .put(&self.endpoints.videos)
            .query(&[("part", "status")])
            .bearer_auth(&access_token)
            .json(&json!({
                "id": video_id,
                "status": { "privacyStatus": "unlisted", "embeddable": true },
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(upstream(response).await);
        }

        tracing::info!(video_id, "video marked unlisted and embeddable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> YouTubeCredentials {
        YouTubeCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    fn client(server: &MockServer) -> YouTubeClient {
        YouTubeClient::with_endpoints(
            credentials(),
            YouTubeEndpoints {
                token: format!("{}/token", server.uri()),
                upload: format!("{}/upload/youtube/v3/videos", server.uri()),
                videos: format!("{}/youtube/v3/videos", server.uri()),
            },
        )
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.token",
                "expires_in": 3599,
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn resumable_upload_returns_watch_url() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(query_param("uploadType", "resumable"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session/abc", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "vid123" })))
            .expect(1)
            .mount(&server)
            .await;

        let video = client(&server)
            .upload(
                UploadedFile::new("tour.mp4", None, vec![0, 0, 0, 24]),
                "Skyline Towers",
            )
            .await
            .expect("upload succeeds");
        assert_eq!(video.video_id, "vid123");
        assert_eq!(video.url, "https://www.youtube.com/watch?v=vid123");
    }

    #[tokio::test]
    async fn refresh_failure_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        match client(&server)
            .upload(UploadedFile::new("tour.mp4", None, Vec::new()), "Tour")
            .await
        {
            Err(MediaError::Auth(body)) => assert_eq!(body, "invalid_grant"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn make_embeddable_updates_status() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("PUT"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("part", "status"))
            .and(body_string_contains("\"embeddable\":true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "vid123" })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .make_embeddable("vid123")
            .await
            .expect("status updated");
    }
}
