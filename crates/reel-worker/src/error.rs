//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    Provider(#[from] reel_provider::ProviderError),

    #[error("Text generation error: {0}")]
    Generation(#[from] reel_textgen::GenerationError),

    #[error("Store error: {0}")]
    Store(#[from] reel_store::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] reel_queue::QueueError),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if a redelivery could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Provider(e) => e.is_retryable(),
            WorkerError::Store(_) | WorkerError::Queue(_) => true,
            WorkerError::ConfigError(_) | WorkerError::Generation(_) => false,
        }
    }
}
