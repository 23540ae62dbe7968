//! Section header recognition for profile documents.

use crate::models::Category;

/// A run of lines under one header (or the preamble, as `General`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub category: Category,
    pub body: String,
}

/// Recognise a section header line.
///
/// Accepts decorated headers (`## Healthcare`, `1. Education`, `**Employment**:`)
/// and inline headers (`Infrastructure: Roads are paved.`). Returns the category
/// and any inline content following the colon.
pub fn parse_header(line: &str) -> Option<(Category, Option<&str>)> {
    let stripped = strip_decorations(line);
    if stripped.is_empty() {
        return None;
    }

    if let Some((head, rest)) = stripped.split_once(':') {
        let category = section_category(head)?;
        let rest = rest.trim();
        // Inline content sits in the original line after the first colon.
        let inline = line
            .split_once(':')
            .map(|(_, r)| r.trim().trim_start_matches(['*', '_']).trim())
            .filter(|r| !r.is_empty() && !rest.is_empty());
        return Some((category, inline));
    }

    section_category(stripped).map(|c| (c, None))
}

fn section_category(name: &str) -> Option<Category> {
    let name = name.trim().trim_matches(['*', '_']).trim();
    match Category::from_name(name) {
        Some(Category::General) | None => None,
        Some(c) => Some(c),
    }
}

fn strip_decorations(line: &str) -> &str {
    let mut s = line.trim();
    s = s.trim_start_matches('#').trim_start();
    s = s.trim_start_matches(['-', '*', '•']).trim_start();

    // List numbering: "1." / "2)"
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &s[digits..];
        if let Some(rest) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
            s = rest.trim_start();
        }
    }

    s = s.trim_matches(['*', '_']).trim();
    s
}

/// Split a document into sections in document order. The first section is
/// always the (possibly empty) `General` preamble.
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut category = Category::General;
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some((next, inline)) = parse_header(line) {
            sections.push(Section {
                category,
                body: lines.join("\n"),
            });
            category = next;
            lines = inline.into_iter().collect();
        } else {
            lines.push(line);
        }
    }

    sections.push(Section {
        category,
        body: lines.join("\n"),
    });
    sections
}
