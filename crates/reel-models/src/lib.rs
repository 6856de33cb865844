//! Shared data models for the Storyreel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video generation tasks and their lifecycle states
//! - Provider execution modes (production vs. simulation)

pub mod task;

// Re-export common types
pub use task::{ProviderMode, TaskId, TaskStatus, VideoTask};
