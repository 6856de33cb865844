//! Redis Streams job queue with delayed scheduling.
//!
//! This crate provides:
//! - Job payload types for the generation pipeline
//! - Immediate enqueueing via Redis Streams with consumer groups
//! - Delayed delivery via a sorted-set buffer promoted by the worker
//! - Retry accounting and a dead-letter stream

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{GenerateVideoJob, JobId, PollOperationJob, QueueJob};
pub use queue::{JobQueue, JobScheduler, QueueConfig};
