//! Knowledge Base: the problem→solution corpus used to ground recommendations.
//!
//! Corpus format is a sequence of blocks:
//!
//! ```text
//! Problem: Lack of piped water supply to households
//! Solution: Extend the village pipeline and fund household tap connections
//! ```
//!
//! Blank lines may appear anywhere. Unprefixed lines directly below a field
//! continue it. A block missing either field is skipped without affecting
//! the rest of the corpus.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::lexicon::significant_words;
use crate::models::KnowledgeEntry;

/// Minimum keyword overlap for a knowledge entry to count as a match.
pub const MIN_OVERLAP: usize = 1;

/// Keywords kept in an index key.
const KEY_KEYWORDS: usize = 3;

struct IndexedEntry {
    entry: KnowledgeEntry,
    keywords: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct KnowledgeMatch<'a> {
    pub entry: &'a KnowledgeEntry,
    pub overlap: usize,
}

#[derive(Default)]
pub struct KnowledgeBase {
    entries: Vec<IndexedEntry>,
    index: BTreeMap<String, Vec<KnowledgeEntry>>,
    skipped: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Problem,
    Solution,
}

/// Index key of a problem: its first three significant keywords, lowercased.
pub fn problem_key(problem: &str) -> String {
    significant_words(problem)
        .into_iter()
        .take(KEY_KEYWORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

impl KnowledgeBase {
    /// Read and parse the corpus file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let corpus = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge corpus {}", path.display()))?;
        let kb = Self::parse(&corpus);
        tracing::info!(
            "Knowledge base: {} entries under {} keys ({} malformed blocks skipped)",
            kb.len(),
            kb.index.len(),
            kb.skipped
        );
        Ok(kb)
    }

    pub fn parse(corpus: &str) -> Self {
        let mut kb = KnowledgeBase::default();
        let mut problem: Option<String> = None;
        let mut solution: Option<String> = None;
        let mut last: Option<Field> = None;

        for raw in corpus.lines() {
            let line = raw.trim();
            if line.is_empty() {
                last = None;
                continue;
            }

            if let Some(rest) = strip_prefix_ci(line, "problem:") {
                kb.finish_block(problem.take(), solution.take());
                problem = Some(rest.trim().to_string());
                last = Some(Field::Problem);
            } else if let Some(rest) = strip_prefix_ci(line, "solution:") {
                if problem.is_some() && solution.is_none() {
                    solution = Some(rest.trim().to_string());
                    last = Some(Field::Solution);
                } else {
                    // Orphan solution: flush whatever is pending, drop this one.
                    kb.finish_block(problem.take(), solution.take());
                    kb.skip_block("solution without problem");
                    last = None;
                }
            } else {
                let target = match last {
                    Some(Field::Problem) => problem.as_mut(),
                    Some(Field::Solution) => solution.as_mut(),
                    None => None,
                };
                if let Some(text) = target {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(line);
                }
            }
        }

        kb.finish_block(problem, solution);
        kb
    }

    fn finish_block(&mut self, problem: Option<String>, solution: Option<String>) {
        match (problem, solution) {
            (None, None) => {}
            (Some(p), Some(s)) if !p.is_empty() && !s.is_empty() => self.push(p, s),
            (Some(_), _) => self.skip_block("problem without solution"),
            (None, Some(_)) => self.skip_block("solution without problem"),
        }
    }

    fn skip_block(&mut self, reason: &str) {
        self.skipped += 1;
        tracing::warn!("Skipping malformed knowledge block: {reason}");
    }

    fn push(&mut self, problem: String, solution: String) {
        let entry = KnowledgeEntry { problem, solution };
        let key = problem_key(&entry.problem);
        self.index.entry(key).or_default().push(entry.clone());
        let keywords = significant_words(&entry.problem).into_iter().collect();
        self.entries.push(IndexedEntry { entry, keywords });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Malformed blocks dropped while parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Keyword index: normalised problem key → entries in corpus order.
    pub fn index(&self) -> &BTreeMap<String, Vec<KnowledgeEntry>> {
        &self.index
    }

    /// Entry whose problem shares the most keywords with `terms`
    /// (at least [`MIN_OVERLAP`]); earlier entries win ties.
    pub fn best_match<S: AsRef<str>>(&self, terms: &[S]) -> Option<KnowledgeMatch<'_>> {
        let query: BTreeSet<String> = terms
            .iter()
            .flat_map(|t| significant_words(t.as_ref()))
            .collect();
        if query.is_empty() {
            return None;
        }

        let mut best: Option<KnowledgeMatch<'_>> = None;
        for indexed in &self.entries {
            let overlap = indexed.keywords.intersection(&query).count();
            if overlap < MIN_OVERLAP {
                continue;
            }
            if best.map_or(true, |b| overlap > b.overlap) {
                best = Some(KnowledgeMatch {
                    entry: &indexed.entry,
                    overlap,
                });
            }
        }
        best
    }
}
