//! Request Orchestrator: drives one request through resolve → retrieve →
//! generate and records the lifecycle it went through.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::generate::{ComparisonGenerator, RecommendationGenerator};
use crate::models::{Chunk, ComparisonResult, Criteria, EntityProfile, RecommendationSet};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Resolving,
    Retrieving,
    Generating,
    Responded,
    NotFound,
    GenerationFailed,
    InsufficientData,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Responded
                | RequestState::NotFound
                | RequestState::GenerationFailed
                | RequestState::InsufficientData
        )
    }

    fn can_advance_to(self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Received, Resolving)
                | (Resolving, Retrieving)
                | (Resolving, NotFound)
                | (Resolving, Responded)
                | (Retrieving, Generating)
                | (Generating, Responded)
                | (Generating, GenerationFailed)
                | (Generating, InsufficientData)
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Received => "RECEIVED",
            RequestState::Resolving => "RESOLVING",
            RequestState::Retrieving => "RETRIEVING",
            RequestState::Generating => "GENERATING",
            RequestState::Responded => "RESPONDED",
            RequestState::NotFound => "NOT_FOUND",
            RequestState::GenerationFailed => "GENERATION_FAILED",
            RequestState::InsufficientData => "INSUFFICIENT_DATA",
        };
        f.write_str(name)
    }
}

/// The states one request has visited, in order.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    id: Uuid,
    visited: Vec<RequestState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            visited: vec![RequestState::Received],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current(&self) -> RequestState {
        self.visited
            .last()
            .copied()
            .unwrap_or(RequestState::Received)
    }

    pub fn visited(&self) -> &[RequestState] {
        &self.visited
    }

    pub fn advance(&mut self, next: RequestState) -> Result<(), PipelineError> {
        let current = self.current();
        if !current.can_advance_to(next) {
            return Err(PipelineError::Internal(format!(
                "illegal request transition {current} -> {next}"
            )));
        }
        tracing::debug!("{current} -> {next}");
        self.visited.push(next);
        Ok(())
    }

    /// Record the terminal state matching `err` and hand the error back.
    pub fn fail(&mut self, err: PipelineError) -> PipelineError {
        let terminal = match &err {
            PipelineError::NotFound(_) => RequestState::NotFound,
            PipelineError::Generation(_) => RequestState::GenerationFailed,
            PipelineError::InsufficientData(_) => RequestState::InsufficientData,
            _ => return err,
        };
        match self.advance(terminal) {
            Ok(()) => err,
            Err(illegal) => illegal,
        }
    }
}

// ─── Stages ──────────────────────────────────────────────

async fn resolve_pair(
    state: &AppState,
    lifecycle: &mut Lifecycle,
    left: &str,
    right: &str,
) -> Result<(Arc<EntityProfile>, Arc<EntityProfile>), PipelineError> {
    lifecycle.advance(RequestState::Resolving)?;
    let resolved = async {
        let l = state.profiles.resolve(left).await?;
        let r = state.profiles.resolve(right).await?;
        Ok::<_, PipelineError>((l, r))
    }
    .await;
    resolved.map_err(|e| lifecycle.fail(e))
}

async fn retrieve_pair(
    state: &AppState,
    lifecycle: &mut Lifecycle,
    left: Arc<EntityProfile>,
    right: Arc<EntityProfile>,
    criteria: Criteria,
) -> Result<(Vec<Chunk>, Vec<Chunk>), PipelineError> {
    lifecycle.advance(RequestState::Retrieving)?;
    let retriever = state.retriever.clone();
    let (left_chunks, right_chunks) = tokio::task::spawn_blocking(move || {
        (
            retriever.retrieve(&left, &criteria),
            retriever.retrieve(&right, &criteria),
        )
    })
    .await
    .map_err(|e| PipelineError::Internal(format!("retrieval task failed: {e}")))?;

    tracing::debug!(
        "Retrieved {} + {} chunks",
        left_chunks.len(),
        right_chunks.len()
    );
    Ok((left_chunks, right_chunks))
}

// ─── Requests ────────────────────────────────────────────

/// Compare two entities over `criteria`.
pub async fn run_comparison(
    state: &AppState,
    left: &str,
    right: &str,
    criteria: Criteria,
) -> Result<ComparisonResult, PipelineError> {
    let mut lifecycle = Lifecycle::new();
    let span = tracing::info_span!("compare", request_id = %lifecycle.id());

    async move {
        tracing::info!("Comparing '{left}' with '{right}'");
        let (l, r) = resolve_pair(state, &mut lifecycle, left, right).await?;
        let (left_chunks, right_chunks) =
            retrieve_pair(state, &mut lifecycle, l.clone(), r.clone(), criteria.clone()).await?;

        lifecycle.advance(RequestState::Generating)?;
        let _permit = state
            .generation_semaphore
            .acquire()
            .await
            .map_err(|_| PipelineError::Unavailable)?;

        let generator = ComparisonGenerator::new(state.backend.clone(), &state.config.llm);
        let result = generator
            .generate(&l.name, &left_chunks, &r.name, &right_chunks, &criteria)
            .await
            .map_err(|e| lifecycle.fail(e.into()))?;

        lifecycle.advance(RequestState::Responded)?;
        Ok::<_, PipelineError>(result)
    }
    .instrument(span)
    .await
}

/// Recommend actions for both entities from their retrieved chunks.
pub async fn run_recommendation(
    state: &AppState,
    left: &str,
    right: &str,
) -> Result<RecommendationSet, PipelineError> {
    let mut lifecycle = Lifecycle::new();
    let span = tracing::info_span!("recommend", request_id = %lifecycle.id());

    async move {
        tracing::info!("Recommending for '{left}' and '{right}'");
        let (l, r) = resolve_pair(state, &mut lifecycle, left, right).await?;
        let (left_chunks, right_chunks) =
            retrieve_pair(state, &mut lifecycle, l.clone(), r.clone(), Criteria::default())
                .await?;

        lifecycle.advance(RequestState::Generating)?;
        let generator = RecommendationGenerator::new(state.knowledge.clone());
        let set = generator
            .recommend(&l.name, &left_chunks, &r.name, &right_chunks)
            .map_err(|e| lifecycle.fail(e.into()))?;

        lifecycle.advance(RequestState::Responded)?;
        Ok::<_, PipelineError>(set)
    }
    .instrument(span)
    .await
}

/// Resolve one entity and return its full profile.
pub async fn run_data(state: &AppState, name: &str) -> Result<Arc<EntityProfile>, PipelineError> {
    let mut lifecycle = Lifecycle::new();
    let span = tracing::info_span!("data", request_id = %lifecycle.id());

    async move {
        lifecycle.advance(RequestState::Resolving)?;
        let profile = state
            .profiles
            .resolve(name)
            .await
            .map_err(|e| lifecycle.fail(e.into()))?;
        lifecycle.advance(RequestState::Responded)?;
        Ok::<_, PipelineError>(profile)
    }
    .instrument(span)
    .await
}
