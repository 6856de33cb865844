//! Gemini REST client for text generation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GenerationError, GenerationResult};
use crate::prompts;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order until one answers.
const MODELS: &[&str] = &["gemini-2.0-flash", "gemini-2.0-flash-lite", "gemini-1.5-pro"];

/// Text generation collaborator contract.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Weave ordered user answers into a short narrative summary.
    async fn summarize(&self, answers: &[String]) -> GenerationResult<String>;

    /// Turn a narrative summary into a video production prompt.
    async fn prompt_from_summary(&self, summary: &str) -> GenerationResult<String>;
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini text generation client.
pub struct GeminiTextClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiTextClient {
    /// Create a new client from the environment.
    pub fn from_env() -> GenerationResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GenerationError::configuration("GEMINI_API_KEY is not set"))?;

        Ok(Self::new(api_key))
    }

    /// Create a new client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Override the API base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run a prompt through the model fallback list.
    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        let mut last_error = None;

        for model in MODELS {
            match self.call_model(model, prompt).await {
                Ok(text) => {
                    info!("Generated text with model {}", model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GenerationError::request("All text generation models failed")))
    }

    async fn call_model(&self, model: &str, prompt: &str) -> GenerationResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::request(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::request(format!("Invalid Gemini response: {}", e)))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse(model.to_string()));
        }

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiTextClient {
    async fn summarize(&self, answers: &[String]) -> GenerationResult<String> {
        if answers.is_empty() {
            return Err(GenerationError::request("No answers to summarize"));
        }
        self.generate(&prompts::summarization_prompt(answers)).await
    }

    async fn prompt_from_summary(&self, summary: &str) -> GenerationResult<String> {
        self.generate(&prompts::video_prompt(summary)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
    }

    #[tokio::test]
    async fn test_summarize_returns_model_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A short story.")))
            .mount(&server)
            .await;

        let client = GeminiTextClient::new("test-key").with_base_url(server.uri());
        let summary = client
            .summarize(&["answer one".to_string()])
            .await
            .expect("summarize");

        assert_eq!(summary, "A short story.");
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("fallback text")))
            .mount(&server)
            .await;

        let client = GeminiTextClient::new("test-key").with_base_url(server.uri());
        let prompt = client.prompt_from_summary("summary").await.expect("prompt");

        assert_eq!(prompt, "fallback text");
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = GeminiTextClient::new("test-key").with_base_url(server.uri());
        let result = client.prompt_from_summary("summary").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_answers_is_an_error() {
        let client = GeminiTextClient::new("test-key");
        assert!(client.summarize(&[]).await.is_err());
    }
}
