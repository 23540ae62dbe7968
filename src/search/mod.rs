//! Chunk retrieval for a comparison's criteria.

pub mod bm25;
pub mod section;

use std::sync::Arc;

use crate::config::{RetrievalConfig, RetrievalMode};
use crate::models::{Category, Chunk, Criteria, EntityProfile};

/// Selects the chunks of one profile that are relevant to the criteria.
///
/// Implementations return at most their budget of chunks and only chunks
/// from `profile`.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, profile: &EntityProfile, criteria: &Criteria) -> Vec<Chunk>;
}

/// Chunks eligible for retrieval: those in a requested section, or, when a
/// profile has none, its `General` chunks.
pub fn candidates<'a>(profile: &'a EntityProfile, criteria: &Criteria) -> Vec<&'a Chunk> {
    let matched: Vec<&Chunk> = profile
        .chunks
        .iter()
        .filter(|c| criteria.contains(c.section))
        .collect();
    if !matched.is_empty() {
        return matched;
    }
    profile
        .chunks
        .iter()
        .filter(|c| c.section == Category::General)
        .collect()
}

/// Build the retriever selected by configuration.
pub fn from_config(config: &RetrievalConfig) -> Arc<dyn Retriever> {
    match config.mode {
        RetrievalMode::Section => Arc::new(section::SectionRetriever::new(config.budget)),
        RetrievalMode::Bm25 => Arc::new(bm25::Bm25Retriever::new(config.budget)),
    }
}
