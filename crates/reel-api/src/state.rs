//! Application state.

use std::sync::Arc;

use reel_queue::JobQueue;
use reel_store::{RedisTaskStore, TaskStore};
use reel_textgen::{GeminiTextClient, TextGenerator};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn TaskStore>,
    pub queue: Arc<JobQueue>,
    pub textgen: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn from_env(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = RedisTaskStore::from_env()?;
        let queue = JobQueue::from_env()?;
        let textgen = GeminiTextClient::from_env()?;

        Ok(Self {
            config,
            store: Arc::new(store),
            queue: Arc::new(queue),
            textgen: Arc::new(textgen),
        })
    }

    /// Create state with explicit collaborators (tests).
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn TaskStore>,
        queue: Arc<JobQueue>,
        textgen: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            store,
            queue,
            textgen,
        }
    }
}
