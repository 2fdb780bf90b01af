use crate::config::Config;
use crate::upload::classify::{FailureStatus, RawFailure};
use crate::upload::types::{HealthStatus, SegmentationResult, SelectedFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Anything that can carry an image to the segmentation service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<SegmentationResult, RawFailure>;

    async fn health(&self) -> Result<HealthStatus, RawFailure>;
}

#[derive(Clone, Debug)]
pub struct SegmentationClient {
    client: Client,
    base_url: String,
    health_retries: u32,
    backoff: Duration,
}

impl SegmentationClient {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            health_retries: config.health_retries,
            backoff: Duration::from_millis(500),
        })
    }

    /// Base delay between health-check attempts; doubles after each failure.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RawFailure> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok());
            return Err(RawFailure::http(status.as_u16(), body));
        }

        response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse response body");
            failure_from(e)
        })
    }

    async fn health_once(&self) -> Result<HealthStatus, RawFailure> {
        let response = self
            .client
            .get(self.build_url("/health"))
            .send()
            .await
            .map_err(failure_from)?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl Transport for SegmentationClient {
    async fn upload(&self, file: &SelectedFile) -> Result<SegmentationResult, RawFailure> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.media_type.mime())
            .map_err(failure_from)?;
        let form = Form::new().part("image", part);

        info!(file = %file.file_name, size = file.size, "POST /upload");
        let response = self
            .client
            .post(self.build_url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(failure_from)?;

        Self::read_json(response).await
    }

    async fn health(&self) -> Result<HealthStatus, RawFailure> {
        let mut delay = self.backoff;
        let mut attempt = 0;

        loop {
            match self.health_once().await {
                Ok(status) => return Ok(status),
                Err(failure) if attempt < self.health_retries => {
                    attempt += 1;
                    debug!(attempt, status = ?failure.status, "Health check failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(failure) => {
                    warn!(status = ?failure.status, "Health check failed");
                    return Err(failure);
                }
            }
        }
    }
}

fn failure_from(error: reqwest::Error) -> RawFailure {
    let status = if error.is_timeout() {
        FailureStatus::TimeoutError
    } else if error.is_decode() {
        FailureStatus::ParsingError
    } else if let Some(code) = error.status() {
        FailureStatus::Http(code.as_u16())
    } else {
        FailureStatus::FetchError
    };
    RawFailure::transport(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::classify::{classify, ClassifiedError};
    use crate::upload::types::ImageType;
    use mockito::{Matcher, Server};

    fn config(url: String) -> Config {
        Config {
            api_url: url,
            timeout_secs: 5,
            health_retries: 3,
        }
    }

    fn client(url: String) -> SegmentationClient {
        SegmentationClient::new(&config(url))
            .unwrap()
            .with_backoff(Duration::from_millis(1))
    }

    fn jpeg() -> SelectedFile {
        SelectedFile {
            file_name: "scan.jpg".to_string(),
            media_type: ImageType::Jpeg,
            size: 9,
            bytes: b"fake jpeg".to_vec(),
        }
    }

    const SUCCESS_BODY: &str = r#"{
        "success": true,
        "original": "AAAA",
        "segmentation": "BBBB",
        "inference_time": 812.5,
        "is_valid_ultrasound": true,
        "confidence_score": 0.82,
        "quality_metrics": {
            "mask_area_ratio": 0.21,
            "mask_circularity": 0.9,
            "edge_sharpness": 0.44,
            "is_valid_shape": true
        },
        "warnings": []
    }"#;

    #[tokio::test]
    async fn upload_sends_multipart_image_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data.*".to_string()),
            )
            .match_body(Matcher::Regex(r#"name="image"; filename="scan.jpg""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUCCESS_BODY)
            .create_async()
            .await;

        let result = client(server.url()).upload(&jpeg()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.confidence_score, 0.82);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn bad_request_keeps_structured_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Not an ultrasound"}"#)
            .create_async()
            .await;

        let failure = client(server.url()).upload(&jpeg()).await.unwrap_err();

        assert_eq!(failure.status, Some(FailureStatus::Http(400)));
        assert_eq!(failure.error_detail(), Some("Not an ultrasound"));
        assert_eq!(
            classify(&failure),
            ClassifiedError::InvalidImage(Some("Not an ultrasound".to_string()))
        );
    }

    #[tokio::test]
    async fn plain_text_error_body_is_dropped() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(413)
            .with_body("Request Entity Too Large")
            .create_async()
            .await;

        let failure = client(server.url()).upload(&jpeg()).await.unwrap_err();

        assert_eq!(failure, RawFailure::http(413, None));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_parsing_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let failure = client(server.url()).upload(&jpeg()).await.unwrap_err();

        assert_eq!(failure.status, Some(FailureStatus::ParsingError));
        assert_eq!(classify(&failure), ClassifiedError::Unknown);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_fetch_error() {
        let failure = client("http://127.0.0.1:1".to_string())
            .upload(&jpeg())
            .await
            .unwrap_err();

        assert_eq!(classify(&failure), ClassifiedError::NetworkUnreachable);
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let slow = SegmentationClient::new(&Config {
            api_url: format!("http://{}", addr),
            timeout_secs: 1,
            health_retries: 0,
        })
        .unwrap();
        let failure = slow.upload(&jpeg()).await.unwrap_err();
        silent.abort();

        assert_eq!(failure.status, Some(FailureStatus::TimeoutError));
        assert_eq!(classify(&failure), ClassifiedError::Timeout);
    }

    #[tokio::test]
    async fn health_gives_up_after_configured_retries() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(500)
            .expect(4)
            .create_async()
            .await;

        let failure = client(server.url()).health().await.unwrap_err();

        mock.assert_async().await;
        assert_eq!(failure.status, Some(FailureStatus::Http(500)));
    }
}
