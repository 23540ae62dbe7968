use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::{body, required};
use crate::error::PipelineError;
use crate::models::{CompareRequest, CompareResponse, Criteria};
use crate::pipeline::run_comparison;
use crate::state::AppState;

/// POST /compare - Narrative comparison of two villages.
///
/// `criteria` may be a list or a comma-separated string; omitted or empty
/// criteria mean all eight sections.
pub async fn compare(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, PipelineError> {
    let req = body(payload)?;
    let village1 = required(req.village1, "village1")?;
    let village2 = required(req.village2, "village2")?;

    let criteria = match req.criteria {
        Some(input) => Criteria::parse(&input.items())
            .map_err(|unknown| PipelineError::Validation(format!("Unknown criterion: {unknown}")))?,
        None => Criteria::default(),
    };

    let result = run_comparison(&state, &village1, &village2, criteria).await?;

    Ok(Json(CompareResponse {
        comparison: result.narrative,
        timestamp: result.generated_at,
        feature_name: result.feature_name,
    }))
}
