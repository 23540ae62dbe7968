use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Constant `feature_name` reported with every comparison.
pub const FEATURE_NAME: &str = "Village Sustainability Comparator";

/// Top-level section of a profile document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Infrastructure,
    Healthcare,
    Education,
    Employment,
    #[serde(rename = "Renewable Energy")]
    RenewableEnergy,
    #[serde(rename = "Digital Access")]
    DigitalAccess,
    #[serde(rename = "Waste Management")]
    WasteManagement,
    #[serde(rename = "Sustainability Efforts")]
    SustainabilityEfforts,
    /// Content outside any recognised section.
    General,
}

impl Category {
    /// The eight fixed sections, in canonical order.
    pub const SECTIONS: [Category; 8] = [
        Category::Infrastructure,
        Category::Healthcare,
        Category::Education,
        Category::Employment,
        Category::RenewableEnergy,
        Category::DigitalAccess,
        Category::WasteManagement,
        Category::SustainabilityEfforts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Infrastructure => "Infrastructure",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Employment => "Employment",
            Category::RenewableEnergy => "Renewable Energy",
            Category::DigitalAccess => "Digital Access",
            Category::WasteManagement => "Waste Management",
            Category::SustainabilityEfforts => "Sustainability Efforts",
            Category::General => "General",
        }
    }

    /// Case-insensitive lookup; `&` and `and` are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = normalize_category_name(name);
        if normalized == "general" {
            return Some(Category::General);
        }
        if normalized == "health care" {
            return Some(Category::Healthcare);
        }
        Category::SECTIONS
            .into_iter()
            .find(|c| normalize_category_name(c.name()) == normalized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize_category_name(name: &str) -> String {
    name.to_lowercase()
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalised lookup key for an entity name: lowercase, single spaces, trimmed.
pub fn entity_key(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A contiguous, single-section segment of a profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_entity: String,
    /// Position in document order, starting at 0.
    pub ordinal: usize,
    pub section: Category,
    pub text: String,
}

/// Text of one section from `chunks`, in chunk order. `General` chunks stand
/// in for a section that has none.
pub fn category_text(chunks: &[&Chunk], category: Category) -> String {
    let join = |section: Category| {
        chunks
            .iter()
            .filter(|c| c.section == section)
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };
    let text = join(category);
    if text.is_empty() && category != Category::General {
        join(Category::General)
    } else {
        text
    }
}

/// A resolved, chunked profile. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProfile {
    pub name: String,
    pub key: String,
    pub raw_text: String,
    pub chunks: Vec<Chunk>,
}

/// Ordered, de-duplicated set of categories a request is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria(Vec<Category>);

impl Default for Criteria {
    fn default() -> Self {
        Criteria(Category::SECTIONS.to_vec())
    }
}

impl Criteria {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut out: Vec<Category> = Vec::new();
        for c in categories {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        if out.is_empty() {
            return Criteria::default();
        }
        Criteria(out)
    }

    /// Parse raw criterion names; the first unknown name is returned as the error.
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Result<Self, String> {
        let mut categories = Vec::new();
        for item in items {
            let item = item.as_ref().trim();
            if item.is_empty() {
                continue;
            }
            match Category::from_name(item) {
                Some(c) => categories.push(c),
                None => return Err(item.to_string()),
            }
        }
        Ok(Criteria::new(categories))
    }

    pub fn categories(&self) -> &[Category] {
        &self.0
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }
}

/// Criteria as sent by clients: a JSON array or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CriteriaInput {
    List(Vec<String>),
    Text(String),
}

impl CriteriaInput {
    pub fn items(&self) -> Vec<String> {
        match self {
            CriteriaInput::List(items) => items.clone(),
            CriteriaInput::Text(text) => text.split(',').map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub narrative: String,
    pub generated_at: DateTime<Utc>,
    pub feature_name: &'static str,
}

/// One problem/solution pair from the knowledge corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
    pub problem: String,
    pub solution: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    pub items: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

// ─── HTTP bodies ─────────────────────────────────────────

/// Compare request. Fields are optional so that missing ones surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub village1: Option<String>,
    #[serde(default)]
    pub village2: Option<String>,
    #[serde(default)]
    pub criteria: Option<CriteriaInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataRequest {
    #[serde(default)]
    pub village: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub village1: Option<String>,
    #[serde(default)]
    pub village2: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareResponse {
    pub comparison: String,
    pub timestamp: DateTime<Utc>,
    pub feature_name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataResponse {
    pub village: String,
    pub chunks: Vec<Chunk>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VillagesResponse {
    pub villages: Vec<String>,
    pub timestamp: DateTime<Utc>,
}
