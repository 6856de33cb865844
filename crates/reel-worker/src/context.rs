//! Shared engine context: collaborators behind trait seams.

use std::sync::Arc;

use tracing::{error, warn};

use reel_models::{ProviderMode, TaskId};
use reel_provider::{SimulatedProvider, VeoClient, VideoProvider};
use reel_queue::{JobQueue, JobScheduler};
use reel_store::{RedisTaskStore, TaskStore};
use reel_textgen::{GeminiTextClient, TextGenerator};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Collaborators shared by the orchestrator and the poller.
///
/// Everything sits behind a trait object so tests can swap in fakes; the
/// production wiring lives in `from_env`.
pub struct EngineContext {
    pub config: WorkerConfig,
    pub store: Arc<dyn TaskStore>,
    pub provider: Arc<dyn VideoProvider>,
    pub textgen: Arc<dyn TextGenerator>,
    pub scheduler: Arc<dyn JobScheduler>,
}

impl EngineContext {
    /// Create the context with explicit collaborators.
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn TaskStore>,
        provider: Arc<dyn VideoProvider>,
        textgen: Arc<dyn TextGenerator>,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            config,
            store,
            provider,
            textgen,
            scheduler,
        }
    }

    /// Production wiring from environment variables.
    ///
    /// `VIDEO_PROVIDER=simulation` selects the offline provider; anything
    /// else selects Veo and requires its credentials.
    pub fn from_env(config: WorkerConfig, queue: Arc<JobQueue>) -> WorkerResult<Self> {
        let mode = std::env::var("VIDEO_PROVIDER").unwrap_or_else(|_| "google_veo".to_string());

        let provider: Arc<dyn VideoProvider> = if mode == ProviderMode::Simulation.as_str() {
            Arc::new(SimulatedProvider::new())
        } else {
            Arc::new(VeoClient::from_env()?)
        };

        let textgen: Arc<dyn TextGenerator> = match GeminiTextClient::from_env() {
            Ok(client) => Arc::new(client),
            Err(e) if mode == ProviderMode::Simulation.as_str() => {
                // Offline development without credentials: prompt synthesis
                // will fail at call time, tasks with explicit prompts run fine.
                warn!("Text generation unavailable: {}", e);
                Arc::new(GeminiTextClient::new(""))
            }
            Err(e) => return Err(e.into()),
        };

        let store = Arc::new(RedisTaskStore::from_env()?);

        Ok(Self::new(config, store, provider, textgen, queue))
    }

    /// Persist a failure message onto a task record, retrying past
    /// concurrent writers.
    ///
    /// Used on paths that are about to re-raise: the record must carry the
    /// terminal state before the error reaches the delivery layer. A task
    /// that is already terminal is left untouched.
    pub(crate) async fn persist_failure(&self, task_id: &TaskId, message: &str) {
        for _ in 0..3 {
            let task = match self.store.load(task_id).await {
                Ok(Some(task)) => task,
                Ok(None) => return,
                Err(e) => {
                    error!("Failed to load task {} for failure write: {}", task_id, e);
                    return;
                }
            };

            if task.is_terminal() {
                return;
            }

            let mut task = task;
            task.fail(message);
            match self.store.save(&task).await {
                Ok(_) => return,
                Err(e) if e.is_precondition_failed() => continue,
                Err(e) => {
                    error!("Failed to persist failure for task {}: {}", task_id, e);
                    return;
                }
            }
        }

        error!(
            "Gave up persisting failure for task {} after repeated conflicts",
            task_id
        );
    }
}

/// Convenience alias used by handlers.
pub type SharedContext = Arc<EngineContext>;

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
