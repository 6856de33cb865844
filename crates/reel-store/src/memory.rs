//! In-memory task store for tests and local development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reel_models::{TaskId, VideoTask};

use crate::error::{StoreError, StoreResult};
use crate::TaskStore;

/// In-process store mirroring the Redis store's revision semantics.
#[derive(Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Arc<RwLock<HashMap<String, VideoTask>>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (test helper).
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn load(&self, id: &TaskId) -> StoreResult<Option<VideoTask>> {
        Ok(self.tasks.read().await.get(id.as_str()).cloned())
    }

    async fn create(&self, task: &VideoTask) -> StoreResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(task.id.as_str()) {
            return Err(StoreError::AlreadyExists(task.id.to_string()));
        }
        tasks.insert(task.id.to_string(), task.clone());
        Ok(())
    }

    async fn save(&self, task: &VideoTask) -> StoreResult<VideoTask> {
        let mut tasks = self.tasks.write().await;

        let stored = tasks
            .get(task.id.as_str())
            .ok_or_else(|| StoreError::not_found(task.id.to_string()))?;

        if stored.revision != task.revision {
            return Err(StoreError::PreconditionFailed(task.id.to_string()));
        }

        let mut updated = task.clone();
        updated.revision = task.revision + 1;
        tasks.insert(task.id.to_string(), updated.clone());
        Ok(updated)
    }
}
