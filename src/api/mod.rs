//! HTTP boundary: request validation and response assembly.

pub mod compare;
pub mod profiles;
pub mod recommend;

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::PipelineError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(profiles::health))
        .route("/villages", get(profiles::list_villages))
        .route("/data", post(profiles::data))
        .route("/compare", post(compare::compare))
        .route("/recommend", post(recommend::recommend))
        .with_state(state)
}

/// Unwrap a JSON body, turning extractor rejections into validation errors.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, PipelineError> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| PipelineError::Validation(rejection.body_text()))
}

/// A required, non-blank string field.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, PipelineError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PipelineError::Validation(format!("{field} is required"))),
    }
}
