use std::cmp::Reverse;

use crate::models::{Chunk, Criteria, EntityProfile};
use crate::search::{candidates, Retriever};

/// Criteria-driven filter: chunks whose section is a requested criterion,
/// earliest first, up to the budget. Header-less profiles contribute their
/// `General` text instead.
pub struct SectionRetriever {
    budget: usize,
}

impl SectionRetriever {
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
        }
    }
}

/// 1 for an exact section match, 0 otherwise.
pub fn section_score(chunk: &Chunk, criteria: &Criteria) -> u32 {
    u32::from(criteria.contains(chunk.section))
}

impl Retriever for SectionRetriever {
    fn retrieve(&self, profile: &EntityProfile, criteria: &Criteria) -> Vec<Chunk> {
        let mut scored = candidates(profile, criteria);
        scored.sort_by_key(|c| (Reverse(section_score(c, criteria)), c.ordinal));

        let selected: Vec<Chunk> = scored
            .into_iter()
            .take(self.budget)
            .cloned()
            .collect();

        tracing::debug!(
            "Retrieved {} of {} chunks for {}",
            selected.len(),
            profile.chunks.len(),
            profile.name
        );
        selected
    }
}
