//! HTTP Backend
//!
//! Implements [`Backend`] over the reference REST service.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST /upload` multipart field `file`
//! - `POST /update_profile` JSON profile
//! - `POST /update_analysis` JSON array of labels
//! - `POST /generate_prescription?isUpdate=<bool>` JSON `{"isUpdate": bool}`
//! - `GET /download?file_path=<path>` raw bytes

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rxassist_sdk::{
    ArtifactRef, AssistantError, ExtractionResult, GenerateRequest, GenerateResponse, Profile,
    UploadResponse,
};
use std::time::Instant;

use super::{Backend, Result};
use crate::config::BackendConfig;

/// Backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    /// Base URL without trailing slash
    base_url: String,

    client: Client,
}

impl HttpBackend {
    /// Create a backend client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| AssistantError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request and turn transport failures and error statuses into errors
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AssistantError::Transport(format!("{} timed out", what))
            } else if e.is_connect() {
                AssistantError::Transport(format!(
                    "Cannot connect to backend at {}. Is it running?",
                    self.base_url
                ))
            } else {
                AssistantError::Transport(e.to_string())
            }
        })?;

        tracing::debug!(
            "{} answered {} in {:.1}s",
            what,
            response.status(),
            start.elapsed().as_secs_f64()
        );

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssistantError::Backend {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ExtractionResult> {
        tracing::info!("Uploading {} ({} bytes)", file_name, bytes.len());

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let request = self.client.post(self.url("upload")).multipart(form);

        let response = self.send(request, "upload").await?;
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::Transport(format!("Failed to read upload response: {}", e)))?;

        // An unreadable body means nothing usable was extracted
        let parsed: UploadResponse = serde_json::from_str(&body).map_err(|e| {
            AssistantError::Extraction(format!("Upload response has no extraction result: {}", e))
        })?;

        Ok(parsed.into_extraction())
    }

    async fn update_profile(&self, profile: &Profile) -> Result<()> {
        let request = self.client.post(self.url("update_profile")).json(profile);
        self.send(request, "profile update").await?;
        Ok(())
    }

    async fn update_selection(&self, labels: &[String]) -> Result<()> {
        let request = self.client.post(self.url("update_analysis")).json(labels);
        self.send(request, "selection update").await?;
        Ok(())
    }

    async fn generate(&self, is_update: bool) -> Result<ArtifactRef> {
        let request = self
            .client
            .post(self.url("generate_prescription"))
            .query(&[("isUpdate", is_update)])
            .json(&GenerateRequest { is_update });

        let response = self.send(request, "generation").await?;
        let body: GenerateResponse = response.json().await.map_err(|e| {
            AssistantError::Decode(format!("Failed to parse generation response: {}", e))
        })?;

        if body.artifact_path.trim().is_empty() {
            return Err(AssistantError::Decode(
                "Generation response has an empty artifact path".to_string(),
            ));
        }

        Ok(ArtifactRef::from(body))
    }

    async fn download(&self, artifact: &ArtifactRef) -> Result<Vec<u8>> {
        let request = self
            .client
            .get(self.url("download"))
            .query(&[("file_path", artifact.as_str())]);

        let response = match self.send(request, "download").await {
            Err(AssistantError::Backend { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Err(AssistantError::ArtifactNotFound(artifact.to_string()));
            }
            other => other?,
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssistantError::Transport(format!("Failed to read download: {}", e)))?;

        Ok(bytes.to_vec())
    }

    async fn check_health(&self) -> bool {
        // Any HTTP answer means the service is up
        self.client.get(self.base_url.as_str()).send().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_properties() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..BackendConfig::default()
        })
        .unwrap();

        assert_eq!(backend.name(), "http");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("upload"), "http://localhost:8000/upload");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            connect_timeout_secs: 1,
            ..BackendConfig::default()
        })
        .unwrap();

        let result = backend.generate(false).await;
        assert!(matches!(result, Err(AssistantError::Transport(_))));
        assert!(!backend.check_health().await);
    }
}
