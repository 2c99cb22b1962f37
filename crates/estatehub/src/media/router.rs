use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{ImageHost, MediaError, UploadedFile, VideoHost};
use crate::http::{failure_from, invalid_body, success};

/// Upper bound for proxied uploads; videos dominate.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
const DEFAULT_FOLDER: &str = "properties";
const DEFAULT_VIDEO_TITLE: &str = "Property Video";

#[derive(Clone)]
pub struct MediaState {
    pub images: Arc<dyn ImageHost>,
    pub videos: Arc<dyn VideoHost>,
}

pub fn media_router(images: Arc<dyn ImageHost>, videos: Arc<dyn VideoHost>) -> Router {
    Router::new()
        .route("/api/upload/imagekit", post(image_upload_handler))
        .route(
            "/api/upload/youtube",
            post(video_upload_handler).patch(video_status_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(MediaState { images, videos })
}

/// Collects the `file` part and one named text field from a multipart form.
async fn read_form(
    mut multipart: Multipart,
    text_field: &str,
) -> Result<(UploadedFile, Option<String>), MediaError> {
    let mut file = None;
    let mut text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| MediaError::Form(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| MediaError::Form(err.body_text()))?;
            if !bytes.is_empty() {
                file = Some(UploadedFile::new(file_name, content_type, bytes.to_vec()));
            }
        } else if name == text_field {
            let value = field
                .text()
                .await
                .map_err(|err| MediaError::Form(err.body_text()))?;
            text = Some(value.trim().to_string()).filter(|value| !value.is_empty());
        }
    }

    file.map(|file| (file, text)).ok_or(MediaError::MissingFile)
}

pub(crate) async fn image_upload_handler(
    State(state): State<MediaState>,
    multipart: Multipart,
) -> Response {
    let result = async {
        let (file, folder) = read_form(multipart, "folder").await?;
        let folder = folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string());
        state.images.upload(file, &folder).await
    }
    .await;

    match result {
        Ok(image) => success(json!({ "url": image.url, "fileId": image.file_id })),
        Err(error) => failure_from(&error),
    }
}

pub(crate) async fn video_upload_handler(
    State(state): State<MediaState>,
    multipart: Multipart,
) -> Response {
    let result = async {
        let (file, title) = read_form(multipart, "title").await?;
        let title = title.unwrap_or_else(|| DEFAULT_VIDEO_TITLE.to_string());
        state.videos.upload(file, &title).await
    }
    .await;

    match result {
        Ok(video) => success(json!({ "url": video.url, "videoId": video.video_id })),
        Err(error) => failure_from(&error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct VideoStatusRequest {
    video_id: String,
}

pub(crate) async fn video_status_handler(
    State(state): State<MediaState>,
    body: Result<Json<VideoStatusRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    if request.video_id.trim().is_empty() {
        return failure_from(&MediaError::MissingVideoId);
    }
    match state.videos.make_embeddable(&request.video_id).await {
        Ok(()) => success(json!({ "videoId": request.video_id })),
        Err(error) => failure_from(&error),
    }
}
