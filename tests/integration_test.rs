//! End-to-end tests for the comparison and recommendation pipeline.
//!
//! A small village corpus is written to a temp directory and served through
//! the real Profile Store, Retriever and generators. Narratives come from the
//! offline extractive backend, so no LLM is required.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use village_compare::config::{Config, RetrievalMode};
use village_compare::error::PipelineError;
use village_compare::generate::comparison::addressed_categories;
use village_compare::knowledge::KnowledgeBase;
use village_compare::llm::extractive::ExtractiveBackend;
use village_compare::llm::{NarrativeBackend, NarrativePrompt};
use village_compare::models::{Category, Chunk, Criteria, EntityProfile, FEATURE_NAME};
use village_compare::pipeline::{run_comparison, run_data, run_recommendation};
use village_compare::profiles::ProfileStore;
use village_compare::search::section::SectionRetriever;
use village_compare::search::Retriever;
use village_compare::state::AppState;

const KAKINADA: &str = "\
Kakinada is a port city on the Godavari delta.

Infrastructure
Piped water reaches every ward. Roads are paved and street lights cover the main roads.
Underground drainage serves the old town.

Healthcare
A government hospital, three private clinics and a 24-hour pharmacy. Ambulance service on call.

Education
Two colleges, a university campus and a public library.

Employment
Port industry, fisheries business and a weekly market provide employment.

Renewable Energy
Solar panels on municipal buildings and a biogas plant at the market yard.

Digital Access
Broadband and 4G coverage across the city. E-governance kiosks at ward offices.

Waste Management
Door-to-door waste collection with segregation at source and a recycling unit.

Sustainability Efforts
Mangrove conservation along the coast and rainwater harvesting in public buildings.
";

const VEMAVARAM: &str = "\
## Infrastructure
Drinking water comes from an overhead tank. The main road is tarred.

## Healthcare
A primary health centre with one doctor.

## Education
One primary school and one high school.

## Employment
Agriculture is the main livelihood; a self-help group runs a tailoring unit.

## Renewable Energy
Few solar street lamps.

## Digital Access
Mobile network coverage is patchy.

## Waste Management
No waste collection; garbage is burned in open plots.

## Sustainability Efforts
A tree plantation drive was held last year.
";

const UNDURU: &str = "\
Infrastructure: Households depend on hand pumps and an open well. Roads are gravel.
Healthcare: A sub-centre with a visiting nurse.
Education: A primary school.
Waste Management: There is no sanitation drive and no toilet in many homes.
";

const SAMALKOTA: &str = "\
Infrastructure: Piped water reaches every household. Roads are paved.
Healthcare: A community health centre with a nurse and a doctor.
Education: A primary school and a junior college.
Waste Management: Door-to-door garbage pickup by the panchayat.
";

const PITHAPURAM: &str = "\
Infrastructure
Water supply from the canal scheme. Bus service to Kakinada.

Healthcare
An area hospital.

Sustainability Efforts
Organic farming awareness camps.
";

const KNOWLEDGE: &str = "\
Problem: Lack of piped water supply to households
Solution: Extend the village pipeline and fund household tap connections

Problem: Poor street lighting on village roads
Solution: Install solar street lights along main roads

Problem: No toilet facilities in homes
Solution: Build individual household latrines under the sanitation mission

Problem: Irregular garbage collection
Solution: Introduce door-to-door collection with source segregation
";

/// Write the corpus to a temp dir and return it with a matching config.
fn corpus() -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let villages = dir.path().join("villages");
    std::fs::create_dir_all(&villages).unwrap();
    for (file, text) in [
        ("Kakinada.txt", KAKINADA),
        ("P. Vemavaram.txt", VEMAVARAM),
        ("Unduru.txt", UNDURU),
        ("Samalkota.txt", SAMALKOTA),
        ("Pithapuram.txt", PITHAPURAM),
    ] {
        std::fs::write(villages.join(file), text).unwrap();
    }
    std::fs::write(dir.path().join("problems.txt"), KNOWLEDGE).unwrap();

    let mut config = Config::default();
    config.data_dir = dir.path().to_path_buf();
    config.llm.provider = "extractive".to_string();
    (dir, config)
}

fn state() -> (TempDir, AppState) {
    let (dir, config) = corpus();
    let state = AppState::new(config).unwrap();
    (dir, state)
}

#[tokio::test]
async fn test_every_village_has_chunks() {
    let (_dir, state) = state();
    let names = state.profiles.names();
    assert_eq!(
        names,
        vec!["Kakinada", "P. Vemavaram", "Pithapuram", "Samalkota", "Unduru"]
    );
    for name in names {
        let profile = run_data(&state, &name).await.unwrap();
        assert!(!profile.chunks.is_empty(), "{name} has no chunks");
        assert!(profile.chunks.iter().all(|c| !c.text.trim().is_empty()));
        assert!(profile.chunks.iter().all(|c| c.source_entity == name));
    }
}

#[tokio::test]
async fn test_unknown_village_is_not_found() {
    let (_dir, state) = state();

    let err = run_data(&state, "Atlantis").await.unwrap_err();
    assert!(matches!(&err, PipelineError::NotFound(name) if name == "Atlantis"));

    let err = run_comparison(&state, "Kakinada", "Atlantis", Criteria::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Atlantis"));

    let err = run_recommendation(&state, "Atlantis", "Unduru").await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
}

#[tokio::test]
async fn test_compare_kakinada_vemavaram_covers_all_categories() {
    let (_dir, state) = state();
    let result = run_comparison(&state, "Kakinada", "P. Vemavaram", Criteria::default())
        .await
        .unwrap();

    assert_eq!(result.feature_name, FEATURE_NAME);
    assert!(result
        .narrative
        .starts_with("Sustainability comparison: Kakinada vs P. Vemavaram"));
    assert!(result.narrative.contains("More sustainable overall: Kakinada"));
    assert_eq!(addressed_categories(&result.narrative), Category::SECTIONS.to_vec());
    assert!(result.narrative.contains("Kakinada is stronger"));
}

#[tokio::test]
async fn test_compare_same_village_reports_no_difference() {
    let (_dir, state) = state();
    let result = run_comparison(&state, "Kakinada", "kakinada", Criteria::default())
        .await
        .unwrap();

    assert!(result.narrative.contains("More sustainable overall: even"));
    assert_eq!(result.narrative.matches("No difference").count(), 8);
    assert!(!result.narrative.contains("is stronger"));
}

#[tokio::test]
async fn test_compare_respects_criteria() {
    let (_dir, state) = state();
    let criteria = Criteria::new([Category::Healthcare, Category::Education]);
    let result = run_comparison(&state, "Unduru", "Samalkota", criteria)
        .await
        .unwrap();

    assert_eq!(
        addressed_categories(&result.narrative),
        vec![Category::Healthcare, Category::Education]
    );
    assert!(!result.narrative.contains("## Infrastructure"));
}

#[tokio::test]
async fn test_recommend_unduru_samalkota_uses_water_solution() {
    let (_dir, state) = state();
    let set = run_recommendation(&state, "Unduru", "Samalkota").await.unwrap();

    assert!(!set.items.is_empty());
    assert_eq!(
        set.items[0],
        "[Infrastructure] Unduru: Extend the village pipeline and fund household tap connections \
         (knowledge base: Lack of piped water supply to households)"
    );
    for item in &set.items {
        assert!(
            item.contains("(knowledge base: ") || item.ends_with("(general guidance)"),
            "untraceable recommendation: {item}"
        );
    }
    assert!(set
        .items
        .iter()
        .any(|i| i.starts_with("[Waste Management] Unduru: Build individual household latrines")));
}

#[tokio::test]
async fn test_chunking_is_deterministic_across_stores() {
    let (_dir, config) = corpus();
    let first = ProfileStore::open(&config.profiles_dir()).unwrap();
    let second = ProfileStore::open(&config.profiles_dir()).unwrap();

    let a = first.resolve("P. Vemavaram").await.unwrap();
    let b = second.resolve("p. vemavaram").await.unwrap();
    assert_eq!(a.chunks, b.chunks);
    assert_eq!(a.chunks.len(), 8);
    assert_eq!(first.load_count(), 1);
}

#[tokio::test]
async fn test_concurrent_disjoint_pairs_do_not_mix() {
    let (_dir, state) = state();

    let baseline_a = run_comparison(&state, "Kakinada", "Unduru", Criteria::default())
        .await
        .unwrap();
    let baseline_b = run_comparison(&state, "Pithapuram", "Samalkota", Criteria::default())
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let s = state.clone();
        tasks.push(tokio::spawn(async move {
            run_comparison(&s, "Kakinada", "Unduru", Criteria::default()).await
        }));
        let s = state.clone();
        tasks.push(tokio::spawn(async move {
            run_comparison(&s, "Pithapuram", "Samalkota", Criteria::default()).await
        }));
    }
    let results = futures_util::future::join_all(tasks).await;

    for (i, joined) in results.into_iter().enumerate() {
        let narrative = joined.unwrap().unwrap().narrative;
        if i % 2 == 0 {
            assert_eq!(narrative, baseline_a.narrative);
            assert!(!narrative.contains("Samalkota") && !narrative.contains("Pithapuram"));
        } else {
            assert_eq!(narrative, baseline_b.narrative);
            assert!(!narrative.contains("Unduru"));
        }
    }

    let recs = futures_util::future::join_all([
        run_recommendation(&state, "Kakinada", "Unduru"),
        run_recommendation(&state, "Pithapuram", "Samalkota"),
    ])
    .await;
    let first = recs[0].as_ref().unwrap();
    let second = recs[1].as_ref().unwrap();
    assert!(first.items.iter().all(|i| i.contains("Kakinada") || i.contains("Unduru")));
    assert!(second
        .items
        .iter()
        .all(|i| i.contains("Pithapuram") || i.contains("Samalkota")));
}

#[tokio::test]
async fn test_bm25_mode_returns_same_categories() {
    let (_dir, mut config) = corpus();
    config.retrieval.mode = RetrievalMode::Bm25;
    let state = AppState::new(config).unwrap();

    let result = run_comparison(&state, "Kakinada", "P. Vemavaram", Criteria::default())
        .await
        .unwrap();
    assert_eq!(addressed_categories(&result.narrative), Category::SECTIONS.to_vec());
}

// ─── Startup ─────────────────────────────────────────────

#[test]
fn test_missing_knowledge_corpus_is_not_fatal() {
    let (dir, config) = corpus();
    std::fs::remove_file(dir.path().join("problems.txt")).unwrap();
    let state = AppState::new(config).unwrap();
    assert!(state.knowledge.is_empty());
}

#[test]
fn test_missing_profile_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = dir.path().join("nowhere");
    config.llm.provider = "extractive".to_string();
    assert!(AppState::new(config).is_err());
}

// ─── Failure paths with scripted collaborators ───────────

struct CountingRetriever {
    inner: SectionRetriever,
    calls: AtomicUsize,
}

impl Retriever for CountingRetriever {
    fn retrieve(&self, profile: &EntityProfile, criteria: &Criteria) -> Vec<Chunk> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.retrieve(profile, criteria)
    }
}

struct FailingBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl NarrativeBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate_narrative(&self, _prompt: &NarrativePrompt) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("upstream 502")
    }
}

struct SlowBackend;

#[async_trait]
impl NarrativeBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate_narrative(&self, _prompt: &NarrativePrompt) -> anyhow::Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("## Healthcare\ntoo late".to_string())
    }
}

fn inline_store() -> ProfileStore {
    ProfileStore::from_documents([("Unduru", UNDURU), ("Samalkota", SAMALKOTA)])
}

#[tokio::test]
async fn test_unresolved_name_never_reaches_retriever_or_backend() {
    let retriever = Arc::new(CountingRetriever {
        inner: SectionRetriever::new(8),
        calls: AtomicUsize::new(0),
    });
    let backend = Arc::new(FailingBackend {
        calls: AtomicUsize::new(0),
    });
    let state = AppState::with_retriever(
        Config::default(),
        inline_store(),
        KnowledgeBase::default(),
        retriever.clone(),
        backend.clone(),
    );

    let err = run_comparison(&state, "Unduru", "Atlantis", Criteria::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backend_failure_is_generation_error() {
    let backend = Arc::new(FailingBackend {
        calls: AtomicUsize::new(0),
    });
    let mut config = Config::default();
    config.llm.max_retries = 2;
    let state = AppState::from_parts(config, inline_store(), KnowledgeBase::default(), backend.clone());

    let err = run_comparison(&state, "Unduru", "Samalkota", Criteria::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_backend_timeout_is_generation_error() {
    let mut config = Config::default();
    config.llm.timeout_secs = 1;
    let state = AppState::from_parts(
        config,
        inline_store(),
        KnowledgeBase::default(),
        Arc::new(SlowBackend),
    );

    let err = run_comparison(&state, "Unduru", "Samalkota", Criteria::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));

    // The store is still usable after the aborted call.
    assert!(run_data(&state, "Unduru").await.is_ok());
}

#[tokio::test]
async fn test_extractive_backend_direct_state() {
    let state = AppState::from_parts(
        Config::default(),
        inline_store(),
        KnowledgeBase::parse(KNOWLEDGE),
        Arc::new(ExtractiveBackend),
    );
    let result = run_comparison(&state, "Unduru", "Samalkota", Criteria::default())
        .await
        .unwrap();
    assert!(result
        .narrative
        .contains("## Infrastructure\nSamalkota is stronger"));
}

#[tokio::test]
async fn test_header_less_villages_compare_from_general_text() {
    for mode in [RetrievalMode::Section, RetrievalMode::Bm25] {
        let mut config = Config::default();
        config.retrieval.mode = mode;
        let state = AppState::from_parts(
            config,
            ProfileStore::from_documents([
                ("Unduru", "Unduru has hand pumps and no clinic. A primary school serves the village."),
                ("Samalkota", "Samalkota has piped water and a hospital. A primary school and a college."),
            ]),
            KnowledgeBase::parse(KNOWLEDGE),
            Arc::new(ExtractiveBackend),
        );

        let result = run_comparison(&state, "Unduru", "Samalkota", Criteria::default())
            .await
            .unwrap();
        assert!(!result.narrative.contains("No retrieved content"));
        assert!(result
            .narrative
            .contains("## Infrastructure\nSamalkota is stronger"));
        assert_eq!(addressed_categories(&result.narrative), Category::SECTIONS.to_vec());

        let set = run_recommendation(&state, "Unduru", "Samalkota").await.unwrap();
        assert_eq!(
            set.items[0],
            "[Infrastructure] Unduru: Extend the village pipeline and fund household tap connections \
             (knowledge base: Lack of piped water supply to households)"
        );
    }
}
