use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::knowledge::KnowledgeBase;
use crate::llm::{self, NarrativeBackend};
use crate::profiles::ProfileStore;
use crate::search::{self, Retriever};

/// Shared application state. Everything here is built once at startup and
/// only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub profiles: Arc<ProfileStore>,
    pub knowledge: Arc<KnowledgeBase>,
    pub retriever: Arc<dyn Retriever>,
    pub backend: Arc<dyn NarrativeBackend>,
    pub generation_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let profiles_dir = config.profiles_dir();
        let profiles = ProfileStore::open(&profiles_dir)
            .with_context(|| format!("Cannot open profile corpus {}", profiles_dir.display()))?;

        let knowledge_path = config.knowledge_path();
        let knowledge = if knowledge_path.exists() {
            KnowledgeBase::load(&knowledge_path)?
        } else {
            tracing::warn!(
                "Knowledge corpus {} not found; recommendations use generic guidance",
                knowledge_path.display()
            );
            KnowledgeBase::default()
        };

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(config.llm.timeout_secs + 5))
            .build()?;
        let backend = llm::from_config(&http_client, &config.llm)?;

        Ok(Self::from_parts(config, profiles, knowledge, backend))
    }

    /// Assemble state from already-built parts; the retriever follows `config.retrieval`.
    pub fn from_parts(
        config: Config,
        profiles: ProfileStore,
        knowledge: KnowledgeBase,
        backend: Arc<dyn NarrativeBackend>,
    ) -> Self {
        let retriever = search::from_config(&config.retrieval);
        Self::with_retriever(config, profiles, knowledge, retriever, backend)
    }

    pub fn with_retriever(
        config: Config,
        profiles: ProfileStore,
        knowledge: KnowledgeBase,
        retriever: Arc<dyn Retriever>,
        backend: Arc<dyn NarrativeBackend>,
    ) -> Self {
        let permits = config.max_concurrent_generations.max(1);
        Self {
            config: Arc::new(config),
            profiles: Arc::new(profiles),
            knowledge: Arc::new(knowledge),
            retriever,
            backend,
            generation_semaphore: Arc::new(tokio::sync::Semaphore::new(permits)),
        }
    }
}
