//! Job payload types for the generation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use reel_models::TaskId;

/// Unique identifier for a queued job (distinct from the task it drives:
/// one task is driven by many poll jobs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job that runs the orchestrator for a task (start or resume generation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateVideoJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Task to orchestrate
    pub task_id: TaskId,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl GenerateVideoJob {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            job_id: JobId::new(),
            task_id,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("generate:{}", self.task_id)
    }
}

/// Job that performs exactly one poll attempt for a running operation.
///
/// The attempt counter is the only state carried between invocations that
/// is not on the task record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOperationJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Task whose operation is polled
    pub task_id: TaskId,
    /// Zero-based poll attempt
    pub attempt: u32,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl PollOperationJob {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            job_id: JobId::new(),
            task_id,
            attempt: 0,
            created_at: Utc::now(),
        }
    }

    /// The follow-up job for the next poll attempt.
    pub fn next_attempt(&self) -> Self {
        Self {
            job_id: JobId::new(),
            task_id: self.task_id.clone(),
            attempt: self.attempt + 1,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("poll:{}:{}", self.task_id, self.attempt)
    }
}

/// Generic job wrapper for queue storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    /// Orchestration job: start or resume generation for a task
    GenerateVideo(GenerateVideoJob),
    /// Continuation job: one poll attempt against the provider
    PollOperation(PollOperationJob),
}

impl QueueJob {
    pub fn job_id(&self) -> &JobId {
        match self {
            QueueJob::GenerateVideo(j) => &j.job_id,
            QueueJob::PollOperation(j) => &j.job_id,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        match self {
            QueueJob::GenerateVideo(j) => &j.task_id,
            QueueJob::PollOperation(j) => &j.task_id,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::GenerateVideo(j) => j.idempotency_key(),
            QueueJob::PollOperation(j) => j.idempotency_key(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueueJob::GenerateVideo(_) => "generate_video",
            QueueJob::PollOperation(_) => "poll_operation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_job_next_attempt() {
        let job = PollOperationJob::new(TaskId::from("task-1"));
        assert_eq!(job.attempt, 0);

        let next = job.next_attempt();
        assert_eq!(next.attempt, 1);
        assert_eq!(next.task_id, job.task_id);
        assert_ne!(next.job_id, job.job_id);
    }

    #[test]
    fn test_queue_job_serde_roundtrip() {
        let job = QueueJob::PollOperation(PollOperationJob {
            job_id: JobId::new(),
            task_id: TaskId::from("task-1"),
            attempt: 3,
            created_at: Utc::now(),
        });

        let json = serde_json::to_string(&job).expect("serialize QueueJob");
        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize QueueJob");

        match decoded {
            QueueJob::PollOperation(j) => {
                assert_eq!(j.task_id.as_str(), "task-1");
                assert_eq!(j.attempt, 3);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_idempotency_keys_distinguish_attempts() {
        let job = PollOperationJob::new(TaskId::from("task-1"));
        assert_ne!(job.idempotency_key(), job.next_attempt().idempotency_key());
    }
}
