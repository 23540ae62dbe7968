//! Category cue vocabulary.
//!
//! Cue terms are the lexical signals used to count sustainability
//! indicators in a chunk and to spot shortfalls. Cues match whole words;
//! a cue shortly after a negation ("no piped water", "lack of clinics") is
//! an explicit deficit rather than an indicator.

use std::collections::BTreeSet;

use crate::models::Category;

const INFRASTRUCTURE: &[&str] = &[
    "piped water",
    "tap water",
    "drinking water",
    "water supply",
    "road",
    "drainage",
    "electricity",
    "street light",
    "bridge",
    "bus service",
];

const HEALTHCARE: &[&str] = &[
    "hospital",
    "clinic",
    "health centre",
    "health center",
    "doctor",
    "nurse",
    "ambulance",
    "pharmacy",
    "vaccination",
    "telemedicine",
];

const EDUCATION: &[&str] = &[
    "school",
    "college",
    "literacy",
    "teacher",
    "library",
    "university",
    "vocational training",
    "digital classroom",
];

const EMPLOYMENT: &[&str] = &[
    "employment",
    "job",
    "industry",
    "business",
    "market",
    "cooperative",
    "self-help group",
    "income",
    "livelihood",
    "skill",
];

const RENEWABLE_ENERGY: &[&str] = &[
    "solar",
    "wind",
    "biogas",
    "renewable",
    "hydro",
    "biomass",
    "energy efficient",
    "led lighting",
];

const DIGITAL_ACCESS: &[&str] = &[
    "internet",
    "broadband",
    "wifi",
    "wi-fi",
    "mobile network",
    "4g",
    "fibre",
    "fiber",
    "digital literacy",
    "e-governance",
    "online",
];

const WASTE_MANAGEMENT: &[&str] = &[
    "waste collection",
    "segregation",
    "recycling",
    "compost",
    "sewage",
    "sanitation",
    "toilet",
    "landfill",
    "door-to-door",
    "garbage",
];

const SUSTAINABILITY_EFFORTS: &[&str] = &[
    "rainwater harvesting",
    "tree plantation",
    "afforestation",
    "conservation",
    "organic farming",
    "plastic ban",
    "watershed",
    "mangrove",
    "green",
    "awareness",
];

const NEGATIVE_WORDS: &[&str] = &[
    "no",
    "not",
    "lack",
    "lacks",
    "lacking",
    "without",
    "absence",
    "absent",
    "shortage",
    "inadequate",
    "poor",
    "limited",
    "insufficient",
    "unavailable",
    "missing",
];

const STOPWORDS: &[&str] = &[
    "the", "of", "and", "a", "an", "in", "for", "to", "is", "are", "was", "were", "be", "with",
    "on", "at", "by", "from", "as", "its", "it", "this", "that", "there", "their", "has", "have",
    "had", "into", "per", "than", "very", "most", "more", "many", "few", "some", "low", "lot",
];

/// Cue terms for a category. `General` uses the cues of every section.
pub fn cues(category: Category) -> Vec<&'static str> {
    match category {
        Category::Infrastructure => INFRASTRUCTURE.to_vec(),
        Category::Healthcare => HEALTHCARE.to_vec(),
        Category::Education => EDUCATION.to_vec(),
        Category::Employment => EMPLOYMENT.to_vec(),
        Category::RenewableEnergy => RENEWABLE_ENERGY.to_vec(),
        Category::DigitalAccess => DIGITAL_ACCESS.to_vec(),
        Category::WasteManagement => WASTE_MANAGEMENT.to_vec(),
        Category::SustainabilityEfforts => SUSTAINABILITY_EFFORTS.to_vec(),
        Category::General => Category::SECTIONS.into_iter().flat_map(cues).collect(),
    }
}

/// Split text into trimmed, non-empty sentences.
pub fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercase alphanumeric words (hyphens kept inside words).
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|w| w.trim_matches('-'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Words that carry meaning for keyword matching: no stopwords, no
/// negation words, at least three characters (digits-bearing tokens such as `4g` kept).
pub fn significant_words(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| !STOPWORDS.contains(&w.as_str()) && !NEGATIVE_WORDS.contains(&w.as_str()))
        .filter(|w| w.chars().count() >= 3 || w.chars().any(|c| c.is_ascii_digit()))
        .collect()
}

/// Which cues a text affirms and which it explicitly reports as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueProfile {
    pub present: BTreeSet<&'static str>,
    pub deficits: BTreeSet<&'static str>,
}

impl CueProfile {
    pub fn indicator_count(&self) -> usize {
        self.present.len()
    }
}

/// Tokens before a cue that a negation word may occupy to negate it.
const NEGATION_WINDOW: usize = 3;

/// Whole-word match, allowing the plural forms used in profiles
/// (`roads`, `clinics`, `industries`).
fn token_matches(token: &str, cue: &str) -> bool {
    token == cue
        || token.strip_suffix('s') == Some(cue)
        || token.strip_suffix("es") == Some(cue)
        || cue
            .strip_suffix('y')
            .is_some_and(|stem| token.strip_suffix("ies") == Some(stem))
}

/// Token positions where `cue` starts; multi-word cues match as token sequences.
fn cue_positions(tokens: &[String], cue: &str) -> Vec<usize> {
    let cue_tokens = words(cue);
    if cue_tokens.is_empty() || cue_tokens.len() > tokens.len() {
        return Vec::new();
    }
    (0..=tokens.len() - cue_tokens.len())
        .filter(|&i| {
            cue_tokens
                .iter()
                .zip(&tokens[i..])
                .all(|(c, t)| token_matches(t, c))
        })
        .collect()
}

fn negated_at(tokens: &[String], position: usize) -> bool {
    tokens[position.saturating_sub(NEGATION_WINDOW)..position]
        .iter()
        .any(|w| NEGATIVE_WORDS.contains(&w.as_str()))
}

/// Occurrences of `cue` in a tokenised sentence as (affirmed, negated).
fn cue_occurrences(tokens: &[String], cue: &str) -> (bool, bool) {
    let mut affirmed = false;
    let mut negated = false;
    for position in cue_positions(tokens, cue) {
        if negated_at(tokens, position) {
            negated = true;
        } else {
            affirmed = true;
        }
    }
    (affirmed, negated)
}

pub fn analyze(category: Category, text: &str) -> CueProfile {
    let cue_terms = cues(category);
    let mut profile = CueProfile::default();

    for sentence in sentences(text) {
        let tokens = words(sentence);
        for cue in &cue_terms {
            let (affirmed, negated) = cue_occurrences(&tokens, cue);
            if affirmed {
                profile.present.insert(*cue);
            }
            if negated {
                profile.deficits.insert(*cue);
            }
        }
    }

    // A cue affirmed anywhere is not a deficit.
    let present = profile.present.clone();
    profile.deficits.retain(|c| !present.contains(c));
    profile
}

/// First sentence of `text` that affirms one of the category's cues.
pub fn first_supporting_sentence(category: Category, text: &str) -> Option<String> {
    let cue_terms = cues(category);
    sentences(text).into_iter().find_map(|s| {
        let tokens = words(s);
        cue_terms
            .iter()
            .any(|c| cue_occurrences(&tokens, c).0)
            .then(|| s.to_string())
    })
}
