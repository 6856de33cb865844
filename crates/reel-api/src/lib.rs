//! Axum HTTP API server.
//!
//! This crate provides the thin web surface over the generation engine:
//! - Task creation and start-or-resume dispatch
//! - Status polling for UIs
//! - Summary generation from user answers

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
