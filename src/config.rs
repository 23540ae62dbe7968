use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding the profile corpus and the knowledge corpus
    pub data_dir: PathBuf,
    /// Overrides `<data_dir>/villages`
    pub profiles_dir: Option<PathBuf>,
    /// Overrides `<data_dir>/problems.txt`
    pub knowledge_path: Option<PathBuf>,
    /// Server bind address
    pub bind_addr: String,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Narrative backend configuration
    pub llm: LlmConfig,
    /// Maximum generations in flight across all requests
    pub max_concurrent_generations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Criteria filter, document order.
    Section,
    /// Criteria filter, BM25-ranked within the filter.
    Bm25,
}

impl RetrievalMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "section" => Some(RetrievalMode::Section),
            "bm25" => Some(RetrievalMode::Bm25),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum chunks returned per entity
    pub budget: usize,
    pub mode: RetrievalMode,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            budget: 8,
            mode: RetrievalMode::Section,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama", "openai" or "extractive"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for narrative generation
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Hard deadline for one generation attempt, in seconds (capped at 300)
    pub timeout_secs: u64,
    /// Extra attempts after a failed one (capped at 3)
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            profiles_dir: None,
            knowledge_path: None,
            bind_addr: "127.0.0.1:9000".to_string(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            max_concurrent_generations: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_retries: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("VILLAGE_COMPARE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("VILLAGE_COMPARE_PROFILES_DIR") {
            config.profiles_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup("VILLAGE_COMPARE_KNOWLEDGE_PATH") {
            config.knowledge_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup("VILLAGE_COMPARE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(val) = lookup("VILLAGE_COMPARE_RETRIEVAL_BUDGET") {
            if let Ok(v) = val.parse::<usize>() {
                config.retrieval.budget = v.max(1);
            }
        }
        if let Some(val) = lookup("VILLAGE_COMPARE_RETRIEVAL_MODE") {
            match RetrievalMode::parse(&val) {
                Some(mode) => config.retrieval.mode = mode,
                None => tracing::warn!("Ignoring unknown retrieval mode '{val}'"),
            }
        }
        if let Some(val) = lookup("VILLAGE_COMPARE_MAX_CONCURRENT_GENERATIONS") {
            if let Ok(v) = val.parse::<usize>() {
                config.max_concurrent_generations = v.max(1);
            }
        }

        // LLM config
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Some(val) = lookup("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.llm.timeout_secs = v.clamp(1, 300);
            }
        }
        if let Some(val) = lookup("LLM_MAX_RETRIES") {
            if let Ok(v) = val.parse::<u32>() {
                config.llm.max_retries = v.min(3);
            }
        }

        config
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.profiles_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("villages"))
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.knowledge_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("problems.txt"))
    }
}
