use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::generate::RecommendError;
use crate::llm::GenerationError;
use crate::profiles::ProfileError;

/// Every way an orchestrated request can fail.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Village not found: {0}")]
    NotFound(String),

    #[error("Comparison generation failed")]
    Generation(#[source] GenerationError),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("{0}")]
    Validation(String),

    #[error("Generation capacity unavailable")]
    Unavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Generation(_)
            | PipelineError::InsufficientData(_)
            | PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProfileError> for PipelineError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(name) => PipelineError::NotFound(name),
            // An unreadable backing document means the profile cannot be resolved.
            ProfileError::Unreadable { name, source } => {
                tracing::error!("Profile '{name}' is unreadable: {source}");
                PipelineError::NotFound(name)
            }
        }
    }
}

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        PipelineError::Generation(err)
    }
}

impl From<RecommendError> for PipelineError {
    fn from(err: RecommendError) -> Self {
        PipelineError::InsufficientData(err.to_string())
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        if let PipelineError::Generation(detail) = &self {
            // Backend detail stays in the logs.
            tracing::error!("Narrative generation failed: {detail}");
        }
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
