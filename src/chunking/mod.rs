//! Profile chunking: one chunk per recognised section, oversized sections
//! split at paragraph boundaries.

pub mod fallback;
pub mod sections;

use crate::models::{Category, Chunk};

/// Chunk a profile document for `entity`.
///
/// Chunks follow document order and never cross a section header. Text before
/// the first header becomes a `General` chunk; a document without any
/// recognised header yields exactly one `General` chunk holding the whole text.
/// Blank documents yield no chunks.
pub fn chunk_profile(entity: &str, raw_text: &str) -> Vec<Chunk> {
    if raw_text.trim().is_empty() {
        return Vec::new();
    }

    let parsed = sections::split_sections(raw_text);
    let has_headers = parsed.iter().any(|s| s.category != Category::General);

    if !has_headers {
        return vec![Chunk {
            source_entity: entity.to_string(),
            ordinal: 0,
            section: Category::General,
            text: raw_text.trim().to_string(),
        }];
    }

    let mut chunks = Vec::new();
    for section in parsed {
        let body = section.body.trim();
        if body.is_empty() {
            continue;
        }
        let pieces = if section.category == Category::General {
            vec![body.to_string()]
        } else {
            fallback::split_section(body)
        };
        for text in pieces {
            chunks.push(Chunk {
                source_entity: entity.to_string(),
                ordinal: chunks.len(),
                section: section.category,
                text,
            });
        }
    }

    chunks
}
