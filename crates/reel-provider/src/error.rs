//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing credentials or endpoints. Fatal, never retried.
    #[error("Provider not configured: {0}")]
    Configuration(String),

    /// Transport or HTTP failure. Surfaced to the delivery layer's retry.
    #[error("Provider request failed: {0}")]
    Request(String),

    /// The provider answered but the response is missing a required field.
    #[error("Provider protocol violation: {0}")]
    Protocol(String),
}

impl ProviderError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Check if error is retryable at the delivery layer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Request(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}
