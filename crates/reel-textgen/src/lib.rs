//! Text generation collaborator.
//!
//! This crate provides:
//! - `summarize`: weave ordered user answers into a short narrative
//! - `prompt_from_summary`: turn a narrative into a video production prompt
//!
//! Both run against the Gemini `generateContent` REST endpoint. The crate
//! does no retrying of its own; a failed call surfaces as a
//! `GenerationError` and retry policy stays with the caller's delivery
//! layer.

pub mod client;
pub mod error;
pub mod prompts;

pub use client::{GeminiTextClient, TextGenerator};
pub use error::{GenerationError, GenerationResult};
