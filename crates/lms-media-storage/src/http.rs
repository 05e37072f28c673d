use crate::traits::{ObjectUploader, UploadError, UploadRequest, UploadResult};
use crate::UploadBackend;
use async_trait::async_trait;
use lms_media_core::UploadOutcome;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use std::time::Duration;

const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

/// Uploader that posts multipart forms (`file` + `folder`) to a remote
/// upload endpoint and reads the resulting URL from a JSON body.
#[derive(Clone, Debug)]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
}

impl HttpUploader {
    /// Create a new HttpUploader
    ///
    /// # Arguments
    /// * `endpoint` - Upload endpoint (e.g., "http://localhost:5000/api/upload")
    /// * `timeout` - Bound on each upload call; expiry surfaces as `Unreachable`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> UploadResult<Self> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(UploadError::ConfigError(format!(
                "Upload endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(request: UploadRequest) -> UploadResult<Form> {
        let size = request.size();
        let file_part = Part::stream_with_length(Body::from(request.data), size)
            .file_name(request.file_name)
            .mime_str(&request.content_type)
            .map_err(|_| {
                UploadError::InvalidRequest(format!(
                    "Invalid media type: {}",
                    request.content_type
                ))
            })?;

        Ok(Form::new()
            .part("file", file_part)
            .text("folder", request.folder))
    }
}

#[async_trait]
impl ObjectUploader for HttpUploader {
    #[tracing::instrument(skip(self, request), fields(folder = %request.folder, size_bytes = request.size()))]
    async fn upload(&self, request: UploadRequest) -> UploadResult<UploadOutcome> {
        let folder = request.folder.clone();
        let size_bytes = request.size();
        let form = Self::build_form(request)?;

        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Unreachable {
                folder: folder.clone(),
                size_bytes,
                message: describe_transport_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if message.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            tracing::warn!(
                folder = %folder,
                size_bytes,
                status = status.as_u16(),
                "Upload rejected by storage endpoint"
            );
            return Err(UploadError::UploadFailed {
                folder,
                size_bytes,
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                UploadError::Unreachable {
                    folder: folder.clone(),
                    size_bytes,
                    message: describe_transport_error(&e),
                }
            } else {
                UploadError::InvalidResponse {
                    folder: folder.clone(),
                    message: format!("Failed to parse response as JSON: {}", e),
                }
            }
        })?;

        let url = body
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| UploadError::InvalidResponse {
                folder: folder.clone(),
                message: "Response did not contain a url".to_string(),
            })?;

        tracing::info!(
            folder = %folder,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "HTTP upload successful"
        );

        Ok(UploadOutcome { url })
    }

    fn backend_type(&self) -> UploadBackend {
        UploadBackend::Http
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn video_request() -> UploadRequest {
        UploadRequest::new(
            b"fake video bytes".to_vec(),
            "video/mp4",
            "lesson.mp4",
            "videos/raw",
        )
    }

    #[tokio::test]
    async fn test_upload_returns_url_from_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="folder""#.to_string()),
                Matcher::Regex("videos/raw".to_string()),
                Matcher::Regex(r#"filename="lesson.mp4""#.to_string()),
                Matcher::Regex("fake video bytes".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"url":"https://cdn.example.com/videos/raw/lesson.mp4"}"#)
            .create_async()
            .await;

        let uploader =
            HttpUploader::new(format!("{}/api/upload", server.url()), Duration::from_secs(5))
                .unwrap();
        let outcome = uploader.upload(video_request()).await.unwrap();

        assert_eq!(outcome.url, "https://cdn.example.com/videos/raw/lesson.mp4");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_upload_failed_with_diagnostics() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/upload")
            .with_status(500)
            .with_body("disk full")
            .create_async()
            .await;

        let uploader =
            HttpUploader::new(format!("{}/api/upload", server.url()), Duration::from_secs(5))
                .unwrap();
        let err = uploader.upload(video_request()).await.unwrap_err();

        match err {
            UploadError::UploadFailed {
                folder,
                size_bytes,
                status,
                message,
            } => {
                assert_eq!(folder, "videos/raw");
                assert_eq!(size_bytes, 16);
                assert_eq!(status, 500);
                assert_eq!(message, "disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_url_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let uploader =
            HttpUploader::new(format!("{}/api/upload", server.url()), Duration::from_secs(5))
                .unwrap();
        let err = uploader.upload(video_request()).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let uploader =
            HttpUploader::new("http://127.0.0.1:1/api/upload", Duration::from_secs(5)).unwrap();
        let err = uploader.upload(video_request()).await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        assert!(matches!(
            HttpUploader::new("ftp://example.com/upload", Duration::from_secs(5)),
            Err(UploadError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_media_type_is_rejected_before_sending() {
        let uploader =
            HttpUploader::new("http://127.0.0.1:1/api/upload", Duration::from_secs(5)).unwrap();
        let request = UploadRequest::new(b"x".to_vec(), "not a mime\n", "x.bin", "attachments");
        let err = uploader.upload(request).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidRequest(_)));
    }
}
