//! Summary generation handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SummaryRequest {
    pub answers: Vec<String>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Turn a user's ordered answers into a narrative summary.
pub async fn generate_summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    let answers: Vec<String> = request
        .answers
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    if answers.is_empty() {
        return Err(ApiError::bad_request("No answers provided"));
    }

    info!("Generating summary from {} answers", answers.len());
    let summary = state.textgen.summarize(&answers).await?;

    Ok(Json(SummaryResponse { summary }))
}
