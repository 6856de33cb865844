//! Redis-backed task store.
//!
//! One JSON document per task under `reel:task:{id}`. The revision
//! precondition runs server-side in a Lua script so the compare and the
//! write are a single atomic step.

use async_trait::async_trait;
use redis::Script;
use tracing::debug;

use reel_models::{TaskId, VideoTask};

use crate::error::{StoreError, StoreResult};
use crate::TaskStore;

const KEY_PREFIX: &str = "reel:task:";

/// Compare-and-swap on the stored document's revision field.
/// Returns 1 on success, 0 on revision mismatch, -1 when the key is gone.
const CAS_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return -1
end
local doc = cjson.decode(current)
if tonumber(doc.revision) ~= tonumber(ARGV[2]) then
    return 0
end
redis.call('SET', KEYS[1], ARGV[1])
return 1
"#;

/// Redis task store.
pub struct RedisTaskStore {
    client: redis::Client,
    cas: Script,
}

impl RedisTaskStore {
    /// Create a new store.
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            cas: Script::new(CAS_SCRIPT),
        })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> StoreResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    fn key(id: &TaskId) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn load(&self, id: &TaskId) -> StoreResult<Option<VideoTask>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, task: &VideoTask) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(task)?;

        let created: bool = redis::cmd("SET")
            .arg(Self::key(&task.id))
            .arg(&payload)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        if !created {
            return Err(StoreError::AlreadyExists(task.id.to_string()));
        }

        debug!("Created task record {}", task.id);
        Ok(())
    }

    async fn save(&self, task: &VideoTask) -> StoreResult<VideoTask> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let mut updated = task.clone();
        updated.revision = task.revision + 1;
        let payload = serde_json::to_string(&updated)?;

        let outcome: i64 = self
            .cas
            .key(Self::key(&task.id))
            .arg(&payload)
            .arg(task.revision)
            .invoke_async(&mut conn)
            .await?;

        match outcome {
            1 => Ok(updated),
            0 => Err(StoreError::PreconditionFailed(task.id.to_string())),
            _ => Err(StoreError::not_found(task.id.to_string())),
        }
    }
}
