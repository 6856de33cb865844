//! Deterministic offline provider for development and tests.

use async_trait::async_trait;
use tracing::info;

use reel_models::ProviderMode;

use crate::error::ProviderResult;
use crate::types::{GenerationOptions, PollOutcome, StartOutcome, VideoProvider};

pub const PROVIDER_ID: &str = "simulation";

/// Provider that completes every generation immediately with a stable local
/// URL derived from the prompt. No network access.
#[derive(Debug, Clone, Default)]
pub struct SimulatedProvider;

impl SimulatedProvider {
    pub fn new() -> Self {
        Self
    }

    /// Stable slug for a prompt, so repeated runs yield the same URL.
    fn slug(prompt: &str) -> String {
        let mut slug: String = prompt
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        slug.truncate(40);
        slug.trim_matches('-').to_string()
    }

    fn result_url(key: &str) -> String {
        format!("https://storage.example.com/simulated/{}.mp4", key)
    }
}

#[async_trait]
impl VideoProvider for SimulatedProvider {
    async fn start_generation(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> ProviderResult<StartOutcome> {
        info!("Simulated generation for prompt ({} chars)", prompt.len());

        // Completes in the start call itself: no handle, nothing to poll.
        Ok(StartOutcome {
            provider: PROVIDER_ID.to_string(),
            mode: ProviderMode::Simulation,
            operation_name: None,
            video_url: Some(Self::result_url(&Self::slug(prompt))),
        })
    }

    async fn poll_operation(&self, operation_name: &str) -> ProviderResult<PollOutcome> {
        // Deterministically done on the first poll, for callers that poll anyway.
        Ok(PollOutcome {
            done: true,
            progress_percent: Some(100),
            video_uri: Some(Self::result_url(operation_name)),
            error_message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_immediately_without_handle() {
        let provider = SimulatedProvider::new();
        let outcome = provider
            .start_generation("A child reading under a tree!", &GenerationOptions::default())
            .await
            .expect("start");

        assert!(outcome.completed_immediately());
        assert!(outcome.operation_name.is_none());
        assert_eq!(outcome.mode, ProviderMode::Simulation);
    }

    #[tokio::test]
    async fn test_result_url_is_deterministic() {
        let provider = SimulatedProvider::new();
        let options = GenerationOptions::default();

        let a = provider.start_generation("same prompt", &options).await.unwrap();
        let b = provider.start_generation("same prompt", &options).await.unwrap();

        assert_eq!(a.video_url, b.video_url);
    }

    #[tokio::test]
    async fn test_poll_is_done_on_first_call() {
        let provider = SimulatedProvider::new();
        let outcome = provider.poll_operation("op-1").await.expect("poll");

        assert!(outcome.done);
        assert!(outcome.video_uri.is_some());
        assert!(outcome.error_message.is_none());
    }
}
