//! Engine facade wiring the analysis components over injected ports

use crate::config::Config;
use crate::error::{Result, SkillAlignerError};
use crate::input::store::SkillStore;
use crate::llm::analyzer::ReasoningClient;
use crate::llm::retry::RetryPolicy;
use crate::llm::service::{EmbeddingService, ReasoningService, VectorIndex};
use crate::market::aggregator::MarketDemandAggregator;
use crate::market::cache::{Clock, SignalCache};
use crate::market::insights::{MarketInsightsGenerator, MarketInsightsReport};
use crate::market::sources::MarketSource;
use crate::market::MarketSignal;
use crate::processing::cluster::ClusterAnalyzer;
use crate::processing::embeddings::{embed_all, mean_vector};
use crate::processing::gap_analyzer::{LearningPath, SkillGapAnalyzer};
use crate::processing::matcher::{MatchScore, MatchScorer};
use crate::processing::normalizer::SkillNormalizer;
use crate::processing::profile::{
    canonical_name, CandidateProfile, CandidateSkill, JobRequirements, Skill, SkillRequirement,
};
use crate::processing::taxonomy::{SkillTaxonomy, UNCATEGORIZED};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// External collaborators the engine runs against
pub struct EnginePorts {
    pub store: Arc<dyn SkillStore>,
    pub sources: Vec<Arc<dyn MarketSource>>,
    pub reasoning: Arc<dyn ReasoningService>,
    pub embeddings: Arc<dyn EmbeddingService>,
    pub vectors: Arc<dyn VectorIndex>,
    pub clock: Arc<dyn Clock>,
}

/// Outcome of ingesting a job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedJob {
    pub job: JobRequirements,
    /// Mean of the skill embeddings, `None` when no skill could be embedded
    pub embedding: Option<Vec<f32>>,
    pub market_data: Vec<MarketSignal>,
}

pub struct SkillEngine {
    config: Config,
    store: Arc<dyn SkillStore>,
    embeddings: Arc<dyn EmbeddingService>,
    vectors: Arc<dyn VectorIndex>,
    reasoning: Arc<ReasoningClient>,
    taxonomy: SkillTaxonomy,
    normalizer: SkillNormalizer,
    aggregator: Arc<MarketDemandAggregator>,
    gaps: Arc<SkillGapAnalyzer>,
    scorer: MatchScorer,
    insights: MarketInsightsGenerator,
}

impl SkillEngine {
    pub fn new(config: Config, ports: EnginePorts) -> Result<Self> {
        config.validate()?;

        let reasoning = Arc::new(ReasoningClient::new(
            ports.reasoning,
            RetryPolicy::from_config(&config.reasoning),
        ));
        let cache = Arc::new(SignalCache::new(ports.store.clone(), ports.clock, config.cache_ttl()));
        let aggregator = Arc::new(MarketDemandAggregator::new(
            ports.sources,
            cache.clone(),
            config.source_timeout(),
        ));
        let gaps = Arc::new(SkillGapAnalyzer::new(reasoning.clone()).with_signal_cache(cache.clone()));
        let scorer = MatchScorer::new(
            config.scoring.clone(),
            &config.market,
            aggregator.clone(),
            gaps.clone(),
            reasoning.clone(),
        )
        .with_embeddings(ports.embeddings.clone());
        let clusters = Arc::new(ClusterAnalyzer::new(reasoning.clone(), config.clustering.clone()));
        let insights = MarketInsightsGenerator::new(ports.store.clone(), cache, clusters, reasoning.clone())
            .with_embeddings(ports.embeddings.clone())
            .with_emerging_limit(config.market.emerging_limit)
            .with_demand_thresholds(config.market.high_demand_job_count, config.market.medium_demand_job_count);

        Ok(Self {
            store: ports.store,
            embeddings: ports.embeddings,
            vectors: ports.vectors,
            taxonomy: SkillTaxonomy::new()?,
            normalizer: SkillNormalizer::new(reasoning.clone()),
            reasoning,
            aggregator,
            gaps,
            scorer,
            insights,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SkillStore> {
        &self.store
    }

    /// Name of the reasoning service behind narrative and enrichment calls
    pub fn reasoning_service(&self) -> &str {
        self.reasoning.service_name()
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.aggregator.source_ids()
    }

    pub async fn normalize(&self, raw: &[String]) -> Vec<String> {
        self.normalizer.normalize(raw).await
    }

    /// Score a job/candidate pair. Malformed records fail validation before
    /// any scoring work starts.
    pub async fn match_score(&self, job: &JobRequirements, candidate: &CandidateProfile) -> Result<MatchScore> {
        let job = job.clone().validated()?;
        let candidate = candidate.clone().validated()?;
        Ok(self.scorer.score(&job, &candidate).await)
    }

    /// Score stored records. A missing record is a `NotFound` error.
    pub async fn match_by_id(&self, job_id: &str, candidate_id: &str) -> Result<MatchScore> {
        let (job, candidate) = tokio::try_join!(self.store.get_job(job_id), self.store.get_candidate(candidate_id))?;
        let job = job.ok_or_else(|| SkillAlignerError::NotFound(format!("job '{}'", job_id)))?;
        let candidate = candidate.ok_or_else(|| SkillAlignerError::NotFound(format!("candidate '{}'", candidate_id)))?;
        self.match_score(&job, &candidate).await
    }

    pub async fn analyze_gap(&self, candidate_skills: &[CandidateSkill], requirements: &[SkillRequirement]) -> LearningPath {
        self.gaps.analyze(candidate_skills, requirements).await
    }

    pub async fn aggregate(&self, skill: &str) -> Result<MarketSignal> {
        self.aggregator.aggregate(skill).await
    }

    pub async fn generate_market_insights(&self) -> Result<MarketInsightsReport> {
        self.insights.generate().await
    }

    pub async fn save_candidate(&self, candidate: CandidateProfile) -> Result<()> {
        let candidate = candidate.validated()?;
        info!("Storing candidate '{}'", candidate.id);
        self.store.upsert_candidate(candidate).await
    }

    /// Ingest a job posting.
    ///
    /// Skill names are normalized, embedded and aggregated; the mean skill
    /// vector goes to the vector index tagged `type=job`, every skill is
    /// upserted into the corpus with its category and embedding, and the
    /// normalized job is stored. Index and store failures are returned.
    pub async fn process_job(&self, job: JobRequirements) -> Result<ProcessedJob> {
        let mut job = job.validated()?;
        info!("Processing job '{}' ({})", job.id, job.title);

        let raw: Vec<String> = job.skills.iter().map(|s| s.name.clone()).collect();
        let normalized = self.normalizer.normalize(&raw).await;
        job.skills = rename_requirements(&job.skills, &SkillNormalizer::basic(&raw), &normalized);
        let names = job.skill_names();

        let embedded = embed_all(self.embeddings.as_ref(), &names).await;
        let vectors: Vec<Vec<f32>> = embedded.iter().map(|(_, v)| v.clone()).collect();
        let embedding = mean_vector(&vectors);

        let signals = self.aggregator.signals_for(&names).await;

        match &embedding {
            Some(vector) => {
                let mut metadata = HashMap::new();
                metadata.insert("type".to_string(), "job".to_string());
                metadata.insert("title".to_string(), job.title.clone());
                self.vectors.upsert(&job.id, vector, metadata).await?;
            }
            None => warn!("No skill of job '{}' could be embedded; skipping vector index", job.id),
        }

        let by_name: HashMap<String, Vec<f32>> = embedded.into_iter().collect();
        let skills: Vec<Skill> = job
            .skills
            .iter()
            .map(|requirement| {
                let name = canonical_name(&requirement.name);
                let category = self.taxonomy.category_of(&name).unwrap_or(UNCATEGORIZED);
                let mut skill = Skill::new(&name, category);
                skill.weight = requirement.importance;
                if let Some(vector) = by_name.get(&name) {
                    skill = skill.with_embedding(vector.clone());
                }
                skill
            })
            .collect();
        self.store.upsert_skills(skills).await?;

        self.store.upsert_job(job.clone()).await?;

        let mut market_data: Vec<MarketSignal> = signals.into_values().collect();
        market_data.sort_by(|a, b| a.skill.cmp(&b.skill));
        info!(
            "Job '{}' stored with {} skill(s), {} market signal(s)",
            job.id,
            job.skills.len(),
            market_data.len()
        );

        Ok(ProcessedJob {
            job,
            embedding,
            market_data,
        })
    }
}

/// Apply normalized names to requirements.
///
/// `basic` and `normalized` correspond position by position when they have
/// the same length; otherwise the basic canonical names are kept. Requirements
/// that collapse onto the same name keep the first occurrence.
fn rename_requirements(requirements: &[SkillRequirement], basic: &[String], normalized: &[String]) -> Vec<SkillRequirement> {
    let mapping: HashMap<&str, &str> = if basic.len() == normalized.len() {
        basic.iter().map(String::as_str).zip(normalized.iter().map(String::as_str)).collect()
    } else {
        HashMap::new()
    };

    let mut seen = HashSet::new();
    requirements
        .iter()
        .filter_map(|req| {
            let key = canonical_name(&req.name);
            let name = mapping.get(key.as_str()).map(|s| s.to_string()).unwrap_or(key);
            seen.insert(name.clone()).then(|| SkillRequirement {
                name,
                ..req.clone()
            })
        })
        .collect()
}
