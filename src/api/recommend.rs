use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::{body, required};
use crate::error::PipelineError;
use crate::models::{RecommendRequest, RecommendResponse};
use crate::pipeline::run_recommendation;
use crate::state::AppState;

/// POST /recommend - Ordered, knowledge-grounded actions for both villages
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, PipelineError> {
    let req = body(payload)?;
    let village1 = required(req.village1, "village1")?;
    let village2 = required(req.village2, "village2")?;

    let set = run_recommendation(&state, &village1, &village2).await?;

    Ok(Json(RecommendResponse {
        recommendations: set.items,
        timestamp: set.generated_at,
    }))
}
