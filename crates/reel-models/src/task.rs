//! Video generation task record and lifecycle states.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is created and waiting to be picked up
    #[default]
    Pending,
    /// Generation is running on the provider
    Processing,
    /// Generation finished and a result URL is available
    Completed,
    /// Generation failed with an error message
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution mode of the video provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMode {
    /// Real provider calls over the network
    Production,
    /// Deterministic offline results, no network access
    Simulation,
}

impl ProviderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderMode::Production => "production",
            ProviderMode::Simulation => "simulation",
        }
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable record of one video generation request.
///
/// The record is the only state shared between the orchestrator and the
/// poller; every mutation goes through a full read-modify-write against the
/// task store, guarded by `revision`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoTask {
    /// Unique task ID
    pub id: TaskId,

    /// User ID (owner)
    pub user_id: String,

    /// AI summary the prompt is derived from (if the prompt was not given)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_text: Option<String>,

    /// Video generation prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Lifecycle state
    #[serde(default)]
    pub status: TaskStatus,

    /// Progress (0-100), monotonically non-decreasing while processing
    #[serde(default)]
    pub progress: u8,

    /// Provider identifier (e.g. "google_veo")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Provider execution mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ProviderMode>,

    /// Opaque operation handle used to poll the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// Result URL, set only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Error message, set only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Free-form metadata (timestamps, provider extras)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency token, bumped by every successful store write
    #[serde(default)]
    pub revision: u64,
}

impl VideoTask {
    /// Create a new pending task.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: TaskId::new(),
            user_id: user_id.into(),
            summary_text: None,
            prompt: None,
            status: TaskStatus::Pending,
            progress: 0,
            provider: None,
            mode: None,
            operation_name: None,
            video_url: None,
            error_message: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    /// Set the generation prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the summary the prompt will be derived from.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary_text = Some(summary.into());
        self
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_processing(&self) -> bool {
        self.status == TaskStatus::Processing
    }

    /// Check if a processing task has gone stale.
    ///
    /// A task is stuck when its last update predates the threshold while it
    /// still claims to be processing - the worker that owned it is presumed
    /// crashed.
    pub fn is_stuck(&self, threshold_secs: i64) -> bool {
        self.is_processing() && (Utc::now() - self.updated_at).num_seconds() > threshold_secs
    }

    /// Transition into processing with a non-zero starting progress.
    pub fn begin_processing(&mut self, initial_progress: u8) {
        self.status = TaskStatus::Processing;
        self.progress = self.progress.max(initial_progress).min(100);
        self.touch();
    }

    /// Attach the provider operation handle.
    ///
    /// The handle is written at most once; later calls are no-ops so that
    /// re-polls always target the original operation.
    pub fn attach_operation(&mut self, name: impl Into<String>) {
        if self.operation_name.is_none() {
            self.operation_name = Some(name.into());
            self.touch();
        }
    }

    /// Record a progress estimate.
    ///
    /// Writes only while processing and only when the value exceeds the
    /// stored one, which keeps progress monotonic under re-delivery.
    /// Returns whether anything was written.
    pub fn record_progress(&mut self, value: u8) -> bool {
        let value = value.min(100);
        if self.is_processing() && value > self.progress {
            self.progress = value;
            self.touch();
            return true;
        }
        false
    }

    /// Finalize as completed with a result URL.
    pub fn complete(&mut self, video_url: impl Into<String>) {
        self.status = TaskStatus::Completed;
        self.video_url = Some(video_url.into());
        self.error_message = None;
        self.progress = 100;
        self.touch();
    }

    /// Finalize as failed with a human-readable message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(error.into());
        self.video_url = None;
        self.touch();
    }

    /// Reset a stuck task so the orchestrator can reprocess it from scratch.
    ///
    /// Clears the provider bookkeeping so the restarted run owns a fresh
    /// operation; the previous one is presumed abandoned.
    pub fn reset_for_retry(&mut self) {
        self.status = TaskStatus::Pending;
        self.progress = 0;
        self.error_message = None;
        self.operation_name = None;
        self.touch();
    }

    /// Insert a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let task = VideoTask::new("user123").with_prompt("a child reading under a tree");

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
        assert!(task.prompt.is_some());
        assert!(!task.is_terminal());
    }

    #[test]
    fn test_task_lifecycle() {
        let mut task = VideoTask::new("user123").with_prompt("prompt");

        task.begin_processing(5);
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.progress, 5);

        task.complete("https://cdn.example.com/videos/out.mp4");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.video_url.is_some());
        assert!(task.error_message.is_none());
        assert!(task.is_terminal());
    }

    #[test]
    fn test_failure_clears_result() {
        let mut task = VideoTask::new("user123");
        task.begin_processing(5);
        task.fail("provider exploded");

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.video_url.is_none());
        assert_eq!(task.error_message.as_deref(), Some("provider exploded"));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut task = VideoTask::new("user123");
        task.begin_processing(10);

        assert!(task.record_progress(40));
        assert!(!task.record_progress(30));
        assert_eq!(task.progress, 40);

        // Terminal tasks never move
        task.complete("https://example.com/v.mp4");
        assert!(!task.record_progress(50));
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn test_operation_handle_set_once() {
        let mut task = VideoTask::new("user123");
        task.attach_operation("operations/abc");
        task.attach_operation("operations/other");

        assert_eq!(task.operation_name.as_deref(), Some("operations/abc"));
    }

    #[test]
    fn test_stuck_detection() {
        let mut task = VideoTask::new("user123");
        task.begin_processing(5);
        assert!(!task.is_stuck(300));

        task.updated_at = Utc::now() - chrono::Duration::seconds(400);
        assert!(task.is_stuck(300));

        // Terminal tasks are never stuck
        task.complete("https://example.com/v.mp4");
        task.updated_at = Utc::now() - chrono::Duration::seconds(400);
        assert!(!task.is_stuck(300));
    }

    #[test]
    fn test_reset_for_retry() {
        let mut task = VideoTask::new("user123");
        task.begin_processing(5);
        task.attach_operation("operations/abc");
        task.record_progress(60);

        task.reset_for_retry();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
        assert!(task.operation_name.is_none());
        assert!(task.error_message.is_none());
    }
}
