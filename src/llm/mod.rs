//! Narrative generation backends.
//!
//! The comparator only talks to [`NarrativeBackend`]; concrete backends are
//! chosen by `LLM_PROVIDER`.

pub mod chat;
pub mod extractive;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::models::{category_text, Category, Chunk};

/// A single chat turn (system, user or assistant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Everything a backend may use to write a comparison narrative.
///
/// `system` and `user` are the rendered prompt; `passages` carries the same
/// retrieved chunks in structured form. Nothing outside `passages` is
/// retrieved content.
#[derive(Debug, Clone)]
pub struct NarrativePrompt {
    pub left: String,
    pub right: String,
    pub criteria: Vec<Category>,
    pub passages: Vec<Chunk>,
    pub system: String,
    pub user: String,
}

impl NarrativePrompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: self.system.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: self.user.clone(),
            },
        ]
    }

    /// Retrieved text for one entity and section, in chunk order. An entity
    /// retrieved only as `General` text uses it for every section.
    pub fn section_text(&self, entity: &str, section: Category) -> String {
        let own: Vec<&Chunk> = self
            .passages
            .iter()
            .filter(|c| c.source_entity == entity)
            .collect();
        category_text(&own, section)
    }
}

#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn generate_narrative(&self, prompt: &NarrativePrompt) -> anyhow::Result<String>;
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("backend returned empty output")]
    Empty,
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),
    #[error("backend failed: {0:#}")]
    Backend(anyhow::Error),
}

/// Build the backend selected by `config.provider`.
pub fn from_config(
    client: &reqwest::Client,
    config: &LlmConfig,
) -> anyhow::Result<Arc<dyn NarrativeBackend>> {
    match config.provider.as_str() {
        "ollama" | "openai" => Ok(Arc::new(chat::ChatBackend::new(
            client.clone(),
            config.clone(),
        ))),
        "extractive" => Ok(Arc::new(extractive::ExtractiveBackend)),
        other => anyhow::bail!("Unsupported LLM provider: {other}"),
    }
}
