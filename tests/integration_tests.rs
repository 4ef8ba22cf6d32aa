//! Integration tests for the skill aligner

use async_trait::async_trait;
use skill_aligner::config::Config;
use skill_aligner::input::{MemoryStore, RecordLoader, SkillStore};
use skill_aligner::llm::{MemoryVectorIndex, OfflineReasoner};
use skill_aligner::market::sources::{MarketSource, SourceResult};
use skill_aligner::market::{ManualClock, Trend};
use skill_aligner::processing::embeddings::HashingEmbedder;
use skill_aligner::processing::profile::{CandidateProfile, CandidateSkill, ProficiencyLevel};
use skill_aligner::{EnginePorts, SkillAlignerError, SkillEngine};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Source answering from a fixed table and counting every query
struct TableSource {
    id: String,
    table: HashMap<String, SourceResult>,
    fail: bool,
    calls: AtomicUsize,
}

impl TableSource {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            table: HashMap::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn with(mut self, skill: &str, score: f64, trend: Trend, job_count: u64) -> Self {
        self.table.insert(
            skill.to_string(),
            SourceResult {
                score,
                trend,
                job_count: Some(job_count),
                avg_salary: Some(120_000.0),
            },
        );
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSource for TableSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn nominal_weight(&self) -> f64 {
        1.0
    }

    async fn fetch_signal(&self, skill: &str) -> skill_aligner::Result<Option<SourceResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SkillAlignerError::InvalidInput(format!("{} is down", self.id)));
        }
        Ok(self.table.get(skill).cloned())
    }
}

struct Harness {
    engine: SkillEngine,
    store: Arc<MemoryStore>,
    vectors: Arc<MemoryVectorIndex>,
    clock: Arc<ManualClock>,
}

fn harness(sources: Vec<Arc<dyn MarketSource>>) -> Harness {
    let mut config = Config::default();
    config.market.cache_ttl_hours = 24;
    config.clustering.seed = Some(7);

    let store = Arc::new(MemoryStore::new());
    let vectors = Arc::new(MemoryVectorIndex::new());
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let ports = EnginePorts {
        store: store.clone(),
        sources,
        reasoning: Arc::new(OfflineReasoner::new().unwrap()),
        embeddings: Arc::new(HashingEmbedder::new(config.clustering.embedding_dimensions)),
        vectors: vectors.clone(),
        clock: clock.clone(),
    };

    Harness {
        engine: SkillEngine::new(config, ports).unwrap(),
        store,
        vectors,
        clock,
    }
}

fn frontend_market() -> Arc<dyn MarketSource> {
    Arc::new(
        TableSource::new("jobs")
            .with("javascript", 0.9, Trend::Stable, 5000)
            .with("react", 0.85, Trend::Rising, 3000)
            .with("typescript", 0.8, Trend::Rising, 2500),
    )
}

async fn load_candidate(path: &str) -> CandidateProfile {
    RecordLoader::new().load_candidate(Path::new(path)).await.unwrap()
}

#[tokio::test]
async fn test_load_records_from_json_and_toml() {
    let mut loader = RecordLoader::new();

    let job = loader.load_job(Path::new("tests/fixtures/job_frontend.json")).await.unwrap();
    assert_eq!(job.title, "Frontend Engineer");
    assert_eq!(job.skills.len(), 3);
    // Parsed from the free-text requirements
    assert_eq!(job.experience.as_ref().map(|e| e.years), Some(3.0));

    let platform = loader.load_job(Path::new("tests/fixtures/job_platform.toml")).await.unwrap();
    assert_eq!(platform.skills[0].proficiency_level, ProficiencyLevel::Intermediate);
    assert_eq!(platform.experience.as_ref().and_then(|e| e.level.as_deref()), Some("senior"));
    assert_eq!(loader.cache_size(), 2);
}

#[tokio::test]
async fn test_invalid_record_is_rejected() {
    let mut loader = RecordLoader::new();
    let result = loader.load_candidate(Path::new("tests/fixtures/candidate_invalid.json")).await;
    assert!(matches!(result, Err(SkillAlignerError::Validation(_))));
}

#[tokio::test]
async fn test_normalize_is_idempotent() {
    let h = harness(vec![frontend_market()]);
    let raw = vec!["JS".to_string(), " ReactJS ".to_string(), "javascript".to_string(), "K8s".to_string()];

    let once = h.engine.normalize(&raw).await;
    assert_eq!(once, vec!["javascript", "react", "kubernetes"]);

    let twice = h.engine.normalize(&once).await;
    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_process_job_indexes_and_stores_normalized_job() {
    let h = harness(vec![frontend_market()]);
    let job = RecordLoader::new()
        .load_job(Path::new("tests/fixtures/job_frontend.json"))
        .await
        .unwrap();

    let processed = h.engine.process_job(job).await.unwrap();
    assert_eq!(processed.job.skill_names(), vec!["javascript", "react", "typescript"]);
    assert_eq!(processed.market_data.len(), 3);
    assert!(processed.embedding.is_some());

    let entry = h.vectors.get("job-frontend").await.unwrap();
    assert_eq!(entry.metadata.get("type").map(String::as_str), Some("job"));
    assert_eq!(entry.metadata.get("title").map(String::as_str), Some("Frontend Engineer"));

    let react = h.store.get_skill("react").await.unwrap().unwrap();
    assert_eq!(react.weight, 0.8);
    assert!(react.embedding.is_some());

    let stored = h.store.get_job("job-frontend").await.unwrap().unwrap();
    assert_eq!(stored.skills[0].name, "javascript");
}

#[tokio::test]
async fn test_perfect_match_scores_high_and_missing_skill_lowers_it() {
    let h = harness(vec![frontend_market()]);
    let job = RecordLoader::new()
        .load_job(Path::new("tests/fixtures/job_frontend.json"))
        .await
        .unwrap();
    h.engine.process_job(job).await.unwrap();

    h.engine.save_candidate(load_candidate("tests/fixtures/candidate_full.json").await).await.unwrap();
    h.engine.save_candidate(load_candidate("tests/fixtures/candidate_partial.json").await).await.unwrap();

    let full = h.engine.match_by_id("job-frontend", "cand-full").await.unwrap();
    assert!(full.total > 0.8, "perfect match scored {}", full.total);
    assert!(full.gap_analysis.is_empty());
    assert_eq!(full.breakdown.skill_match, 1.0);
    assert!(!full.insights.is_empty());

    let partial = h.engine.match_by_id("job-frontend", "cand-partial").await.unwrap();
    assert!(partial.total < full.total);
    assert_eq!(partial.gap_analysis.skill_names(), vec!["typescript"]);
    let gap = partial.gap_analysis.get("typescript").unwrap();
    assert!(gap.current_level.is_none());
    assert!(!gap.required);
}

#[tokio::test]
async fn test_match_by_id_unknown_record_is_not_found() {
    let h = harness(vec![frontend_market()]);
    h.engine.save_candidate(load_candidate("tests/fixtures/candidate_full.json").await).await.unwrap();

    let err = h.engine.match_by_id("missing-job", "cand-full").await.unwrap_err();
    assert!(matches!(err, SkillAlignerError::NotFound(_)));
}

#[tokio::test]
async fn test_rising_high_demand_outranks_stable_medium() {
    let market: Arc<dyn MarketSource> = Arc::new(
        TableSource::new("jobs")
            .with("rust", 0.6, Trend::Rising, 2000)
            .with("cobol", 0.6, Trend::Stable, 500),
    );
    let h = harness(vec![market]);

    let mut loader = RecordLoader::new();
    let mut rust_job = loader.load_job(Path::new("tests/fixtures/job_frontend.json")).await.unwrap();
    rust_job.id = "job-rust".to_string();
    rust_job.skills.truncate(1);
    rust_job.skills[0].name = "rust".to_string();
    let mut cobol_job = rust_job.clone();
    cobol_job.id = "job-cobol".to_string();
    cobol_job.skills[0].name = "cobol".to_string();

    let candidate = CandidateProfile {
        id: "cand-both".to_string(),
        name: None,
        skills: vec![
            CandidateSkill {
                name: "rust".to_string(),
                proficiency_level: ProficiencyLevel::Expert,
                years_of_experience: 4.0,
            },
            CandidateSkill {
                name: "cobol".to_string(),
                proficiency_level: ProficiencyLevel::Expert,
                years_of_experience: 4.0,
            },
        ],
        experience: None,
        learning_speed: None,
        adaptability_score: None,
    };
    // Only the required skill is held so extra skills do not blur the comparison
    let mut rust_only = candidate.clone();
    rust_only.skills.truncate(1);
    let mut cobol_only = candidate;
    cobol_only.skills.remove(0);

    let rising = h.engine.match_score(&rust_job, &rust_only).await.unwrap();
    let stable = h.engine.match_score(&cobol_job, &cobol_only).await.unwrap();
    assert!(
        rising.breakdown.market_alignment > stable.breakdown.market_alignment,
        "{} <= {}",
        rising.breakdown.market_alignment,
        stable.breakdown.market_alignment
    );
}

#[tokio::test]
async fn test_market_signal_cached_within_ttl() {
    let source = Arc::new(TableSource::new("jobs").with("rust", 0.7, Trend::Rising, 1500));
    let h = harness(vec![source.clone()]);

    let first = h.engine.aggregate("Rust").await.unwrap();
    let second = h.engine.aggregate("rust").await.unwrap();
    assert_eq!(source.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(first.sources, vec!["jobs"]);

    h.clock.advance(chrono::Duration::hours(25));
    h.engine.aggregate("rust").await.unwrap();
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_all_sources_failing_is_no_data() {
    let h = harness(vec![
        Arc::new(TableSource::new("jobs").failing()),
        Arc::new(TableSource::new("repos").failing()),
    ]);

    let err = h.engine.aggregate("cobol").await.unwrap_err();
    assert!(matches!(err, SkillAlignerError::NoDataAvailable { ref skill } if skill == "cobol"));
}

#[tokio::test]
async fn test_learning_path_puts_prerequisites_first() {
    let h = harness(vec![frontend_market()]);
    let job = RecordLoader::new()
        .load_job(Path::new("tests/fixtures/job_platform.toml"))
        .await
        .unwrap();
    let candidate = vec![CandidateSkill {
        name: "linux".to_string(),
        proficiency_level: ProficiencyLevel::Intermediate,
        years_of_experience: 3.0,
    }];

    let path = h.engine.analyze_gap(&candidate, &job.skills).await;
    assert_eq!(path.skill_names(), vec!["docker", "kubernetes"]);
    let kubernetes = path.get("kubernetes").unwrap();
    assert!(kubernetes.prerequisites.contains(&"docker".to_string()));
}

#[tokio::test]
async fn test_market_insights_over_ingested_jobs() {
    let h = harness(vec![frontend_market()]);
    let job = RecordLoader::new()
        .load_job(Path::new("tests/fixtures/job_frontend.json"))
        .await
        .unwrap();
    h.engine.process_job(job).await.unwrap();

    let report = h.engine.generate_market_insights().await.unwrap();
    assert!(report.trends.rising.contains(&"react".to_string()));
    assert!(report.trends.stable.contains(&"javascript".to_string()));
    assert!(report.trends.declining.is_empty());
    assert!(!report.clusters.is_empty());
    assert!(!report.recommendations.is_empty());

    let clustered: usize = report.clusters.iter().map(|c| c.skills.len()).sum();
    assert_eq!(clustered, 3);
}
