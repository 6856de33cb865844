//! Google Veo client over the Gemini long-running-operations REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reel_models::ProviderMode;

use crate::error::{ProviderError, ProviderResult};
use crate::types::{GenerationOptions, PollOutcome, StartOutcome, VideoProvider};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "veo-2.0-generate-001";

pub const PROVIDER_ID: &str = "google_veo";

/// Start request: `models/{model}:predictLongRunning`.
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    name: Option<String>,
}

/// Poll response: `GET {operation_name}`.
#[derive(Debug, Deserialize)]
struct OperationResponse {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    metadata: Option<OperationMetadata>,
    #[serde(default)]
    response: Option<OperationResult>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationMetadata {
    #[serde(default)]
    progress_percent: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    #[serde(default)]
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

/// Google Veo video generation client.
pub struct VeoClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl VeoClient {
    /// Create a new client from the environment.
    ///
    /// Missing credentials are a configuration error, not a request error:
    /// the caller must not retry.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::configuration("GEMINI_API_KEY is not set"))?;
        let model = std::env::var("VEO_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, model))
    }

    /// Create a new client with explicit credentials.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Override the API base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VideoProvider for VeoClient {
    async fn start_generation(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> ProviderResult<StartOutcome> {
        let url = format!(
            "{}/models/{}:predictLongRunning?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = PredictRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: Parameters {
                aspect_ratio: options.aspect_ratio.clone(),
                duration_seconds: options.duration_seconds,
                negative_prompt: options.negative_prompt.clone(),
            },
        };

        info!(
            "Starting Veo generation (model: {}, prompt length: {})",
            self.model,
            prompt.len()
        );

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::request(format!(
                "Veo start returned {}: {}",
                status, body
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::request(format!("Invalid Veo start response: {}", e)))?;

        // An accepted request without an operation name cannot be tracked.
        let operation_name = match parsed.name {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(ProviderError::protocol(
                    "Veo accepted the request but returned no operation name",
                ))
            }
        };

        debug!("Veo operation started: {}", operation_name);

        Ok(StartOutcome {
            provider: PROVIDER_ID.to_string(),
            mode: ProviderMode::Production,
            operation_name: Some(operation_name),
            video_url: None,
        })
    }

    async fn poll_operation(&self, operation_name: &str) -> ProviderResult<PollOutcome> {
        let url = format!("{}/{}?key={}", self.base_url, operation_name, self.api_key);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::request(format!(
                "Veo poll returned {}: {}",
                status, body
            )));
        }

        let parsed: OperationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::request(format!("Invalid Veo poll response: {}", e)))?;

        let video_uri = parsed
            .response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .and_then(|g| g.generated_samples.first())
            .and_then(|s| s.video.as_ref())
            .and_then(|v| v.uri.clone());

        Ok(PollOutcome {
            done: parsed.done,
            progress_percent: parsed.metadata.and_then(|m| m.progress_percent),
            video_uri,
            error_message: parsed.error.map(|e| e.message).filter(|m| !m.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VeoClient {
        VeoClient::new("test-key", "veo-test").with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_start_generation_returns_operation_name() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/veo-test:predictLongRunning"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": "operations/op-1" })),
            )
            .mount(&server)
            .await;

        let outcome = client(&server)
            .start_generation("a child reading under a tree", &GenerationOptions::default())
            .await
            .expect("start");

        assert_eq!(outcome.operation_name.as_deref(), Some("operations/op-1"));
        assert_eq!(outcome.provider, PROVIDER_ID);
        assert!(!outcome.completed_immediately());
    }

    #[tokio::test]
    async fn test_start_without_operation_name_is_protocol_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let result = client(&server)
            .start_generation("prompt", &GenerationOptions::default())
            .await;

        assert!(matches!(result, Err(ProviderError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_start_http_failure_is_request_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client(&server)
            .start_generation("prompt", &GenerationOptions::default())
            .await;

        assert!(matches!(result, Err(ProviderError::Request(_))));
    }

    #[tokio::test]
    async fn test_poll_running_operation() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/operations/op-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": false,
                "metadata": { "progressPercent": 40 }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .poll_operation("operations/op-1")
            .await
            .expect("poll");

        assert!(!outcome.done);
        assert_eq!(outcome.progress_percent, Some(40));
        assert!(outcome.video_uri.is_none());
    }

    #[tokio::test]
    async fn test_poll_completed_operation_extracts_uri() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/operations/op-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [
                            { "video": { "uri": "https://storage.example.com/out.mp4" } }
                        ]
                    }
                }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .poll_operation("operations/op-1")
            .await
            .expect("poll");

        assert!(outcome.done);
        assert_eq!(
            outcome.video_uri.as_deref(),
            Some("https://storage.example.com/out.mp4")
        );
    }

    #[tokio::test]
    async fn test_poll_surfaces_provider_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": true,
                "error": { "message": "content policy violation" }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .poll_operation("operations/op-1")
            .await
            .expect("poll");

        assert!(outcome.done);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("content policy violation")
        );
    }
}
