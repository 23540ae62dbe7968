use anyhow::{Context, Result};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexWriter, ReloadPolicy};

use crate::lexicon;
use crate::models::{Chunk, Criteria, EntityProfile};
use crate::search::{candidates, Retriever};

/// Writer heap for the per-call in-RAM index (tantivy's minimum).
const WRITER_HEAP_BYTES: usize = 15_000_000;

/// Section filter followed by BM25 ranking of the surviving chunks against
/// the criteria names and their cue terms.
pub struct Bm25Retriever {
    budget: usize,
}

impl Bm25Retriever {
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
        }
    }
}

/// Query text for a set of criteria: category names plus their cue terms.
pub fn criteria_query(criteria: &Criteria) -> String {
    let mut terms: Vec<String> = Vec::new();
    for category in criteria.categories() {
        let mut words = lexicon::words(category.name());
        for cue in lexicon::cues(*category) {
            words.extend(lexicon::words(cue));
        }
        for word in words {
            for part in word.split('-').filter(|p| !p.is_empty()) {
                if !terms.iter().any(|t| t == part) {
                    terms.push(part.to_string());
                }
            }
        }
    }
    terms.join(" ")
}

/// BM25 score per candidate index, built over an in-RAM tantivy index.
fn bm25_scores(candidates: &[&Chunk], query_str: &str) -> Result<Vec<f32>> {
    let mut schema_builder = Schema::builder();
    let f_position = schema_builder.add_u64_field("position", NumericOptions::default() | STORED);
    let f_text = schema_builder.add_text_field("text", TEXT);
    let schema = schema_builder.build();

    let index = Index::create_in_ram(schema);
    let mut writer: IndexWriter = index
        .writer_with_num_threads(1, WRITER_HEAP_BYTES)
        .context("Failed to create index writer")?;

    for (position, chunk) in candidates.iter().enumerate() {
        writer.add_document(doc!(
            f_position => position as u64,
            f_text => chunk.text.clone(),
        ))?;
    }
    writer.commit().context("Failed to commit index")?;

    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()
        .context("Failed to create reader")?;
    let searcher = reader.searcher();

    let query_parser = QueryParser::for_index(&index, vec![f_text]);
    let (query, _errors) = query_parser.parse_query_lenient(query_str);

    let top_docs = searcher
        .search(&query, &TopDocs::with_limit(candidates.len().max(1)))
        .context("Search failed")?;

    let mut scores = vec![0.0f32; candidates.len()];
    for (score, address) in top_docs {
        let doc: TantivyDocument = searcher
            .doc(address)
            .context("Failed to retrieve document")?;
        if let Some(position) = doc.get_first(f_position).and_then(|v| v.as_u64()) {
            if let Some(slot) = scores.get_mut(position as usize) {
                *slot = score;
            }
        }
    }
    Ok(scores)
}

impl Retriever for Bm25Retriever {
    fn retrieve(&self, profile: &EntityProfile, criteria: &Criteria) -> Vec<Chunk> {
        let candidates = candidates(profile, criteria);
        if candidates.is_empty() {
            return Vec::new();
        }

        let scores = match bm25_scores(&candidates, &criteria_query(criteria)) {
            Ok(scores) => scores,
            Err(e) => {
                tracing::warn!("BM25 ranking failed for {}, using section order: {e:#}", profile.name);
                vec![0.0; candidates.len()]
            }
        };

        let mut ranked: Vec<(f32, &Chunk)> = scores.into_iter().zip(candidates).collect();
        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.ordinal.cmp(&b.1.ordinal))
        });

        ranked
            .into_iter()
            .take(self.budget)
            .map(|(_, c)| c.clone())
            .collect()
    }
}
