//! Splitter for oversized sections.
//!
//! Three-tier strategy, all within a single section:
//! 1. Split at blank lines (paragraph boundaries)
//! 2. Merge consecutive paragraphs up to the character budget
//! 3. A paragraph still over budget is split at single newlines

/// Maximum non-whitespace characters per chunk.
pub const CHAR_BUDGET: usize = 1500;

/// Split one section body into budget-sized pieces, preserving order.
pub fn split_section(body: &str) -> Vec<String> {
    let body = body.trim();
    if body.is_empty() {
        return Vec::new();
    }
    if weight(body) <= CHAR_BUDGET {
        return vec![body.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_chars = 0usize;

    for paragraph in paragraphs(body) {
        let chars = weight(paragraph);

        if chars > CHAR_BUDGET {
            flush(&mut current, &mut current_chars, &mut pieces);
            split_by_lines(paragraph, &mut pieces);
        } else if !current.is_empty() && current_chars + chars > CHAR_BUDGET {
            flush(&mut current, &mut current_chars, &mut pieces);
            current.push(paragraph);
            current_chars = chars;
        } else {
            current.push(paragraph);
            current_chars += chars;
        }
    }

    flush(&mut current, &mut current_chars, &mut pieces);
    pieces
}

fn weight(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

fn paragraphs(body: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0usize;
    let mut offset = 0usize;

    for line in body.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                out.push(body[s..end].trim());
            }
        } else {
            if start.is_none() {
                start = Some(line_start);
            }
            end = offset;
        }
    }
    if let Some(s) = start {
        out.push(body[s..end].trim());
    }
    out
}

fn flush<'a>(current: &mut Vec<&'a str>, chars: &mut usize, pieces: &mut Vec<String>) {
    if !current.is_empty() {
        pieces.push(current.join("\n\n"));
        current.clear();
    }
    *chars = 0;
}

fn split_by_lines(paragraph: &str, pieces: &mut Vec<String>) {
    let mut lines: Vec<&str> = Vec::new();
    let mut chars = 0usize;

    for line in paragraph.lines() {
        let line_chars = weight(line);
        if !lines.is_empty() && chars + line_chars > CHAR_BUDGET {
            pieces.push(lines.join("\n"));
            lines.clear();
            chars = 0;
        }
        lines.push(line);
        chars += line_chars;
    }

    if !lines.is_empty() {
        pieces.push(lines.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_section_untouched() {
        assert_eq!(split_section("  one\ntwo  "), vec!["one\ntwo"]);
        assert!(split_section(" \n ").is_empty());
    }

    #[test]
    fn test_splits_at_blank_lines() {
        let block1 = "Solar lights on every street. ".repeat(40);
        let block2 = "Biogas units in every ward. ".repeat(40);
        let pieces = split_section(&format!("{block1}\n\n{block2}"));
        assert_eq!(pieces.len(), 2);
        assert!(pieces[0].starts_with("Solar"));
        assert!(pieces[1].starts_with("Biogas"));
    }

    #[test]
    fn test_merges_small_paragraphs() {
        let small = "Short paragraph.";
        let big = "x".repeat(CHAR_BUDGET - 10);
        let pieces = split_section(&format!("{small}\n\n{small}\n\n{big}"));
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0], "Short paragraph.\n\nShort paragraph.");
    }

    #[test]
    fn test_oversized_paragraph_split_by_lines() {
        let line = "y".repeat(600);
        let paragraph = vec![line.as_str(); 5].join("\n");
        let pieces = split_section(&paragraph);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| weight(p) <= CHAR_BUDGET));
    }
}
