//! Provider contract and normalized result shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reel_models::ProviderMode;

use crate::error::ProviderResult;

/// Generation knobs forwarded to the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Target aspect ratio, e.g. "16:9"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Clip length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,

    /// Things the video must not contain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

impl GenerationOptions {
    pub fn with_aspect_ratio(mut self, aspect: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect.into());
        self
    }

    pub fn with_duration_seconds(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// Normalized result of a start-generation call.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    /// Provider identifier recorded on the task (e.g. "google_veo")
    pub provider: String,
    /// Execution mode the call ran in
    pub mode: ProviderMode,
    /// Operation handle for polling; absent when completed immediately
    pub operation_name: Option<String>,
    /// Result URL; present only when the provider completed synchronously
    pub video_url: Option<String>,
}

impl StartOutcome {
    /// True when the provider finished in the start call itself and no
    /// polling is needed.
    pub fn completed_immediately(&self) -> bool {
        self.video_url.is_some()
    }
}

/// Normalized result of one poll attempt.
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    /// Whether the operation reached a terminal state on the provider
    pub done: bool,
    /// Provider-reported progress, when it reports one
    pub progress_percent: Option<u8>,
    /// Result URI; expected iff done without error
    pub video_uri: Option<String>,
    /// Provider-side failure message
    pub error_message: Option<String>,
}

/// Contract for external video generation providers.
///
/// Implementations are stateless translation layers; no side effects beyond
/// the outbound call itself.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Kick off generation for a prompt.
    async fn start_generation(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> ProviderResult<StartOutcome>;

    /// Poll a previously started operation.
    async fn poll_operation(&self, operation_name: &str) -> ProviderResult<PollOutcome>;
}
