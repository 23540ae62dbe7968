//! Offline backend that writes the comparison straight from the retrieved
//! passages. Deterministic, so it doubles as the backend for tests and demos.

use async_trait::async_trait;
use std::fmt::Write;

use crate::lexicon::{analyze, first_supporting_sentence};
use crate::llm::{NarrativeBackend, NarrativePrompt};
use crate::models::Category;

pub struct ExtractiveBackend;

#[async_trait]
impl NarrativeBackend for ExtractiveBackend {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn generate_narrative(&self, prompt: &NarrativePrompt) -> anyhow::Result<String> {
        let mut out = String::new();
        for category in &prompt.criteria {
            let _ = writeln!(out, "## {category}");
            let _ = writeln!(out, "{}\n", category_verdict(prompt, *category));
        }
        Ok(out.trim_end().to_string())
    }
}

fn category_verdict(prompt: &NarrativePrompt, category: Category) -> String {
    let left_text = prompt.section_text(&prompt.left, category);
    let right_text = prompt.section_text(&prompt.right, category);

    if left_text.is_empty() && right_text.is_empty() {
        return format!(
            "No retrieved content for either {} or {}; no difference can be stated.",
            prompt.left, prompt.right
        );
    }

    let left_count = analyze(category, &left_text).indicator_count();
    let right_count = analyze(category, &right_text).indicator_count();

    if left_count == right_count {
        return format!(
            "No difference: {} and {} each show {} indicator(s).",
            prompt.left, prompt.right, left_count
        );
    }

    let (stronger, stronger_text, weaker, weaker_text, high, low) = if left_count > right_count {
        (&prompt.left, &left_text, &prompt.right, &right_text, left_count, right_count)
    } else {
        (&prompt.right, &right_text, &prompt.left, &left_text, right_count, left_count)
    };

    let mut verdict = format!("{stronger} is stronger ({high} indicator(s) vs {low}).");
    if let Some(sentence) = first_supporting_sentence(category, stronger_text) {
        let _ = write!(verdict, " Evidence: \"{sentence}.\"");
    }
    if weaker_text.is_empty() {
        let _ = write!(verdict, " No {category} data was retrieved for {weaker}.");
    }
    verdict
}
