use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::api::{body, required};
use crate::error::PipelineError;
use crate::models::{DataRequest, DataResponse, HealthResponse, VillagesResponse};
use crate::pipeline::run_data;
use crate::state::AppState;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

/// GET /villages - Names the profile store can resolve
pub async fn list_villages(State(state): State<AppState>) -> Json<VillagesResponse> {
    Json(VillagesResponse {
        villages: state.profiles.names(),
        timestamp: Utc::now(),
    })
}

/// POST /data - Every chunk of one village's profile, in document order
pub async fn data(
    State(state): State<AppState>,
    payload: Result<Json<DataRequest>, JsonRejection>,
) -> Result<Json<DataResponse>, PipelineError> {
    let req = body(payload)?;
    let village = required(req.village, "village")?;

    let profile = run_data(&state, &village).await?;

    Ok(Json(DataResponse {
        village: profile.name.clone(),
        chunks: profile.chunks.clone(),
        timestamp: Utc::now(),
    }))
}
