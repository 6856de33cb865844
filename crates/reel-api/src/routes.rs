//! API routes.

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::health;
use crate::handlers::summaries::generate_summary;
use crate::handlers::tasks::{create_task, get_task_status, resume_task};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let task_routes = Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/:task_id", get(get_task_status))
        .route("/tasks/:task_id/resume", post(resume_task))
        .route("/summaries", post(generate_summary));

    Router::new()
        .route("/health", get(health))
        .nest("/api", task_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
