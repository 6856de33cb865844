//! Video generation provider clients.
//!
//! This crate is a pure translation layer between the engine's task shapes
//! and provider wire formats:
//! - `VeoClient`: Google Veo long-running operations over the Gemini REST API
//! - `SimulatedProvider`: deterministic offline results for development and
//!   tests without network access

pub mod error;
pub mod simulated;
pub mod types;
pub mod veo;

pub use error::{ProviderError, ProviderResult};
pub use simulated::SimulatedProvider;
pub use types::{GenerationOptions, PollOutcome, StartOutcome, VideoProvider};
pub use veo::VeoClient;
