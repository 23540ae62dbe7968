//! Comparison and recommendation generation over retrieved chunks.

pub mod comparison;
pub mod recommend;

pub use comparison::ComparisonGenerator;
pub use recommend::{RecommendError, RecommendationGenerator};
