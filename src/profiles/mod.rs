//! Profile Store: resolves entity names to chunked, immutable profiles.
//!
//! The set of resolvable names is fixed when the store is built. Each name
//! owns a `OnceCell` latch, so the first resolution reads and chunks the
//! document while concurrent callers for the same name wait on that single
//! load; later calls are plain reads.

pub mod corpus;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::chunking::chunk_profile;
use crate::models::{entity_key, EntityProfile};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("No data found for '{0}'")]
    NotFound(String),
    #[error("Failed to read profile for '{name}'")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
enum DocumentSource {
    File(PathBuf),
    Inline(String),
}

struct Slot {
    name: String,
    source: DocumentSource,
    profile: OnceCell<Arc<EntityProfile>>,
}

pub struct ProfileStore {
    slots: HashMap<String, Slot>,
    loads: AtomicUsize,
}

impl ProfileStore {
    /// Index the non-blank `*.txt` documents in `dir`. Documents are chunked
    /// on first resolution.
    pub fn open(dir: &Path) -> Result<Self> {
        let files = corpus::scan_profiles(dir)?;
        let store = Self::from_sources(
            files
                .into_iter()
                .map(|f| (f.name, DocumentSource::File(f.path))),
        );
        tracing::info!(
            "Profile corpus: {} documents in {}",
            store.slots.len(),
            dir.display()
        );
        Ok(store)
    }

    /// Build a store over in-memory documents as `(name, text)` pairs.
    /// Blank documents are not indexed.
    pub fn from_documents<N, T>(documents: impl IntoIterator<Item = (N, T)>) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Self::from_sources(documents.into_iter().filter_map(|(n, t)| {
            let name: String = n.into();
            let text: String = t.into();
            (!text.trim().is_empty()).then(|| (name, DocumentSource::Inline(text)))
        }))
    }

    fn from_sources(sources: impl IntoIterator<Item = (String, DocumentSource)>) -> Self {
        let mut slots: HashMap<String, Slot> = HashMap::new();
        for (name, source) in sources {
            let key = entity_key(&name);
            if key.is_empty() {
                continue;
            }
            if let Some(existing) = slots.get(&key) {
                tracing::warn!(
                    "Profile '{name}' collides with '{}' on key '{key}'; keeping the first",
                    existing.name
                );
                continue;
            }
            slots.insert(
                key,
                Slot {
                    name,
                    source,
                    profile: OnceCell::new(),
                },
            );
        }
        Self {
            slots,
            loads: AtomicUsize::new(0),
        }
    }

    /// Resolve a name (case-insensitive, whitespace-normalised, exact match).
    pub async fn resolve(&self, name: &str) -> Result<Arc<EntityProfile>, ProfileError> {
        let key = entity_key(name);
        let slot = self
            .slots
            .get(&key)
            .ok_or_else(|| ProfileError::NotFound(name.trim().to_string()))?;

        let profile = slot
            .profile
            .get_or_try_init(|| self.load(&key, slot))
            .await?;
        Ok(Arc::clone(profile))
    }

    async fn load(&self, key: &str, slot: &Slot) -> Result<Arc<EntityProfile>, ProfileError> {
        let raw_text = match &slot.source {
            DocumentSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|source| {
                ProfileError::Unreadable {
                    name: slot.name.clone(),
                    source,
                }
            })?,
            DocumentSource::Inline(text) => text.clone(),
        };

        let chunks = chunk_profile(&slot.name, &raw_text);
        if chunks.is_empty() {
            tracing::warn!("Profile '{}' is now blank; treating as unresolved", slot.name);
            return Err(ProfileError::NotFound(slot.name.clone()));
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Loaded profile '{}' ({} chunks)", slot.name, chunks.len());

        Ok(Arc::new(EntityProfile {
            name: slot.name.clone(),
            key: key.to_string(),
            raw_text,
            chunks,
        }))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(&entity_key(name))
    }

    /// Display names of every resolvable entity, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.values().map(|s| s.name.clone()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    /// Number of documents parsed so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}
