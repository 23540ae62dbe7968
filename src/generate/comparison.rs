use chrono::Utc;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::lexicon::analyze;
use crate::llm::prompt::build_prompt;
use crate::llm::{GenerationError, NarrativeBackend, NarrativePrompt};
use crate::models::{entity_key, Category, Chunk, ComparisonResult, Criteria, FEATURE_NAME};

const MISSING_STATEMENT: &str = "No comparative statement was produced for this category.";

/// Turns two entities' retrieved chunks into a comparison narrative.
pub struct ComparisonGenerator {
    backend: Arc<dyn NarrativeBackend>,
    timeout: Duration,
    max_retries: u32,
}

impl ComparisonGenerator {
    pub fn new(backend: Arc<dyn NarrativeBackend>, config: &LlmConfig) -> Self {
        Self::with_policy(backend, config.timeout(), config.max_retries)
    }

    pub fn with_policy(backend: Arc<dyn NarrativeBackend>, timeout: Duration, max_retries: u32) -> Self {
        Self {
            backend,
            timeout,
            max_retries,
        }
    }

    pub async fn generate(
        &self,
        left: &str,
        left_chunks: &[Chunk],
        right: &str,
        right_chunks: &[Chunk],
        criteria: &Criteria,
    ) -> Result<ComparisonResult, GenerationError> {
        let mut narrative = format!("Sustainability comparison: {left} vs {right}\n\n");
        narrative.push_str(&overview(left, left_chunks, right, right_chunks));
        narrative.push('\n');

        if entity_key(left) == entity_key(right) {
            tracing::debug!("Same entity on both sides; skipping narrative backend");
            for category in criteria.categories() {
                let _ = write!(
                    narrative,
                    "## {category}\nNo difference: both sides are {left}.\n\n"
                );
            }
        } else {
            let prompt = build_prompt(left, left_chunks, right, right_chunks, criteria.categories());
            let body = self.call_backend(&prompt).await?;
            narrative.push_str(body.trim());
            narrative.push_str("\n\n");

            let covered = addressed_categories(&body);
            for category in criteria.categories() {
                if !covered.contains(category) {
                    let _ = write!(narrative, "## {category}\n{MISSING_STATEMENT}\n\n");
                }
            }
        }

        Ok(ComparisonResult {
            narrative: narrative.trim_end().to_string(),
            generated_at: Utc::now(),
            feature_name: FEATURE_NAME,
        })
    }

    /// One attempt per deadline, plus up to `max_retries` logged retries.
    async fn call_backend(&self, prompt: &NarrativePrompt) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome =
                tokio::time::timeout(self.timeout, self.backend.generate_narrative(prompt)).await;
            let err = match outcome {
                Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text),
                Ok(Ok(_)) => GenerationError::Empty,
                Ok(Err(e)) => GenerationError::Backend(e),
                Err(_) => GenerationError::Timeout(self.timeout),
            };

            if attempt > self.max_retries {
                return Err(err);
            }
            tracing::warn!(
                "Narrative backend '{}' attempt {attempt}/{} failed: {err}; retrying",
                self.backend.name(),
                self.max_retries + 1
            );
        }
    }
}

/// Sustainability indicators found across an entity's retrieved chunks.
pub fn indicator_total(chunks: &[Chunk]) -> usize {
    chunks
        .iter()
        .map(|c| analyze(c.section, &c.text).indicator_count())
        .sum()
}

fn overview(left: &str, left_chunks: &[Chunk], right: &str, right_chunks: &[Chunk]) -> String {
    let left_total = indicator_total(left_chunks);
    let right_total = indicator_total(right_chunks);
    let verdict = if left_total > right_total {
        format!("More sustainable overall: {left}")
    } else if right_total > left_total {
        format!("More sustainable overall: {right}")
    } else {
        "More sustainable overall: even".to_string()
    };

    format!(
        "Overview\n- {left}: {left_total} sustainability indicator(s) in retrieved passages\n\
         - {right}: {right_total} sustainability indicator(s) in retrieved passages\n{verdict}\n"
    )
}

/// Categories a narrative has a `## <Category>` block for.
pub fn addressed_categories(narrative: &str) -> Vec<Category> {
    narrative
        .lines()
        .filter_map(|line| line.strip_prefix("## "))
        .filter_map(|name| Category::from_name(name.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        replies: Vec<anyhow::Result<String>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(replies: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NarrativeBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_narrative(&self, _prompt: &NarrativePrompt) -> anyhow::Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(n) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{e}")),
                None => Ok(String::new()),
            }
        }
    }

    struct Slow;

    #[async_trait]
    impl NarrativeBackend for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate_narrative(&self, _prompt: &NarrativePrompt) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("## Education\nlate".to_string())
        }
    }

    fn chunk(entity: &str, section: Category, text: &str) -> Chunk {
        Chunk {
            source_entity: entity.into(),
            ordinal: 0,
            section,
            text: text.into(),
        }
    }

    fn education() -> Criteria {
        Criteria::new([Category::Education, Category::Healthcare])
    }

    #[tokio::test]
    async fn test_fills_categories_the_backend_skipped() {
        let backend = Scripted::new(vec![Ok("## Education\nA is stronger.".to_string())]);
        let generator = ComparisonGenerator::with_policy(backend, Duration::from_secs(5), 0);
        let left = vec![chunk("A", Category::Education, "Two schools and a library.")];

        let result = generator
            .generate("A", &left, "B", &[], &education())
            .await
            .unwrap();

        assert!(result.narrative.starts_with("Sustainability comparison: A vs B\n"));
        assert!(result.narrative.contains("- A: 2 sustainability indicator(s)"));
        assert!(result.narrative.contains("More sustainable overall: A"));
        assert!(result
            .narrative
            .contains(&format!("## Healthcare\n{MISSING_STATEMENT}")));
        assert_eq!(
            addressed_categories(&result.narrative),
            vec![Category::Education, Category::Healthcare]
        );
        assert_eq!(result.feature_name, FEATURE_NAME);
    }

    #[tokio::test]
    async fn test_category_named_in_passing_still_gets_a_block() {
        let backend = Scripted::new(vec![Ok(
            "## Employment\nA is stronger; its vocational education centre trains workers."
                .to_string(),
        )]);
        let generator = ComparisonGenerator::with_policy(backend, Duration::from_secs(5), 0);
        let criteria = Criteria::new([Category::Employment, Category::Education]);

        let result = generator.generate("A", &[], "B", &[], &criteria).await.unwrap();
        assert_eq!(
            addressed_categories(&result.narrative),
            vec![Category::Employment, Category::Education]
        );
        assert!(result
            .narrative
            .ends_with(&format!("## Education\n{MISSING_STATEMENT}")));
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let backend = Scripted::new(vec![Ok("   \n".to_string())]);
        let generator = ComparisonGenerator::with_policy(backend, Duration::from_secs(5), 0);
        let err = generator.generate("A", &[], "B", &[], &education()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Empty));
    }

    #[tokio::test]
    async fn test_backend_error_surfaces() {
        let backend = Scripted::new(vec![Err(anyhow::anyhow!("model offline"))]);
        let generator = ComparisonGenerator::with_policy(backend, Duration::from_secs(5), 0);
        let err = generator.generate("A", &[], "B", &[], &education()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Backend(_)));
        assert!(err.to_string().contains("model offline"));
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let deadline = Duration::from_millis(50);
        let generator = ComparisonGenerator::with_policy(Arc::new(Slow), deadline, 0);
        let err = generator.generate("A", &[], "B", &[], &education()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(d) if d == deadline));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let backend = Scripted::new(vec![
            Err(anyhow::anyhow!("first")),
            Ok("## Education\nrecovered".to_string()),
        ]);
        let generator =
            ComparisonGenerator::with_policy(backend.clone(), Duration::from_secs(5), 1);
        let result = generator.generate("A", &[], "B", &[], &education()).await.unwrap();
        assert!(result.narrative.contains("recovered"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);

        let backend = Scripted::new(vec![]);
        let generator =
            ComparisonGenerator::with_policy(backend.clone(), Duration::from_secs(5), 2);
        assert!(generator.generate("A", &[], "B", &[], &education()).await.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_same_entity_skips_backend() {
        let backend = Scripted::new(vec![]);
        let generator =
            ComparisonGenerator::with_policy(backend.clone(), Duration::from_secs(5), 0);
        let chunks = vec![chunk("Kakinada", Category::Education, "A college.")];

        let result = generator
            .generate("Kakinada", &chunks, "Kakinada", &chunks, &Criteria::default())
            .await
            .unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(result.narrative.contains("More sustainable overall: even"));
        assert_eq!(result.narrative.matches("No difference").count(), 8);
        assert_eq!(addressed_categories(&result.narrative).len(), 8);
    }
}
