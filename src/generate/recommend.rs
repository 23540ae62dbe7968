//! Recommendation Generator: finds each entity's shortfalls per category and
//! grounds an action in the knowledge base, falling back to generic advice.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::knowledge::KnowledgeBase;
use crate::lexicon::{analyze, CueProfile};
use crate::models::{category_text, Category, Chunk, RecommendationSet};

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("insufficient data: no profile content for {left} or {right}")]
    InsufficientData { left: String, right: String },
}

/// A category where one entity falls short, and the cue terms describing the gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub category: Category,
    pub entity: String,
    pub terms: BTreeSet<&'static str>,
}

pub struct RecommendationGenerator {
    knowledge: Arc<KnowledgeBase>,
}

impl RecommendationGenerator {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    pub fn recommend(
        &self,
        left: &str,
        left_chunks: &[Chunk],
        right: &str,
        right_chunks: &[Chunk],
    ) -> Result<RecommendationSet, RecommendError> {
        if left_chunks.is_empty() && right_chunks.is_empty() {
            return Err(RecommendError::InsufficientData {
                left: left.to_string(),
                right: right.to_string(),
            });
        }

        let shortfalls = find_shortfalls(left, left_chunks, right, right_chunks);
        tracing::debug!("{} shortfall(s) across {left} and {right}", shortfalls.len());

        let items = if shortfalls.is_empty() {
            [left, right]
                .into_iter()
                .map(|entity| {
                    format!(
                        "[{}] {entity}: {} (general guidance)",
                        Category::General,
                        generic_advice(Category::General)
                    )
                })
                .collect()
        } else {
            shortfalls.iter().map(|s| self.item_for(s)).collect()
        };

        Ok(RecommendationSet {
            items,
            generated_at: Utc::now(),
        })
    }

    fn item_for(&self, shortfall: &Shortfall) -> String {
        let terms: Vec<&str> = shortfall.terms.iter().copied().collect();
        match self.knowledge.best_match(&terms) {
            Some(found) => format!(
                "[{}] {}: {} (knowledge base: {})",
                shortfall.category, shortfall.entity, found.entry.solution, found.entry.problem
            ),
            None => format!(
                "[{}] {}: {} (general guidance)",
                shortfall.category,
                shortfall.entity,
                generic_advice(shortfall.category)
            ),
        }
    }
}

/// Shortfalls in category order, left entity before right within a category.
pub fn find_shortfalls(
    left: &str,
    left_chunks: &[Chunk],
    right: &str,
    right_chunks: &[Chunk],
) -> Vec<Shortfall> {
    let mut out = Vec::new();
    let left_refs: Vec<&Chunk> = left_chunks.iter().collect();
    let right_refs: Vec<&Chunk> = right_chunks.iter().collect();

    for category in Category::SECTIONS {
        let left_text = category_text(&left_refs, category);
        let right_text = category_text(&right_refs, category);
        let left_cues = analyze(category, &left_text);
        let right_cues = analyze(category, &right_text);

        let sides = [
            (left, &left_text, &left_cues, &right_text, &right_cues),
            (right, &right_text, &right_cues, &left_text, &left_cues),
        ];
        for (entity, own_text, own, other_text, other) in sides {
            if let Some(terms) = gap_terms(own_text, own, other_text, other) {
                out.push(Shortfall {
                    category,
                    entity: entity.to_string(),
                    terms,
                });
            }
        }
    }
    out
}

/// Deficit cues plus cues only the other side affirms; `None` when there is no gap.
fn gap_terms(
    own_text: &str,
    own: &CueProfile,
    other_text: &str,
    other: &CueProfile,
) -> Option<BTreeSet<&'static str>> {
    let missing_section = own_text.is_empty() && !other_text.is_empty();
    let mut terms: BTreeSet<&'static str> = own.deficits.clone();
    terms.extend(other.present.difference(&own.present).copied());

    if terms.is_empty() && !missing_section {
        None
    } else {
        Some(terms)
    }
}

/// Category-level fallback when no knowledge entry matches.
pub fn generic_advice(category: Category) -> &'static str {
    match category {
        Category::Infrastructure => {
            "Assess water supply, road and drainage gaps, then prioritise household piped water and all-weather roads"
        }
        Category::Healthcare => {
            "Establish a mobile health clinic or telemedicine link and train local health workers"
        }
        Category::Education => {
            "Strengthen local schools with trained teachers, a library and digital classrooms"
        }
        Category::Employment => {
            "Support self-help groups and vocational skill training linked to local markets"
        }
        Category::RenewableEnergy => {
            "Conduct an energy audit and install solar or biogas systems for public buildings"
        }
        Category::DigitalAccess => {
            "Set up public Wi-Fi hotspots and run digital literacy training"
        }
        Category::WasteManagement => {
            "Introduce waste segregation at source with door-to-door collection and composting"
        }
        Category::SustainabilityEfforts => {
            "Launch rainwater harvesting, tree plantation drives and community awareness programmes"
        }
        Category::General => {
            "Maintain current services and set up regular monitoring to sustain progress across all sectors"
        }
    }
}
