//! Durable task record store.
//!
//! Every mutation of a task record is a full read-modify-write: the caller
//! loads a record, mutates it, and saves it back. `save` is preconditioned
//! on the revision it loaded, so two actors racing on the same record can
//! never both win - the loser gets `StoreError::PreconditionFailed` and
//! treats the record as owned by someone else.

pub mod error;
pub mod memory;
pub mod redis;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryTaskStore;
pub use redis::RedisTaskStore;

use async_trait::async_trait;
use reel_models::{TaskId, VideoTask};

/// Persistence contract for task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load a record. `Ok(None)` when the record does not exist (a deleted
    /// task is not an error for the engine).
    async fn load(&self, id: &TaskId) -> StoreResult<Option<VideoTask>>;

    /// Create a fresh record. Fails with `AlreadyExists` on id collision.
    async fn create(&self, task: &VideoTask) -> StoreResult<()>;

    /// Atomic full-record update, preconditioned on `task.revision`
    /// matching the stored revision. On success returns the record with the
    /// bumped revision; on a stale revision returns `PreconditionFailed`.
    async fn save(&self, task: &VideoTask) -> StoreResult<VideoTask>;
}
