//! Multi-factor job/candidate scoring

use crate::config::{DemandMultipliers, MarketConfig, ScoringConfig, TrendMultipliers};
use crate::llm::analyzer::ReasoningClient;
use crate::llm::prompts::InsightParams;
use crate::llm::service::EmbeddingService;
use crate::market::aggregator::MarketDemandAggregator;
use crate::market::{DemandLevel, MarketSignal, Trend};
use crate::processing::embeddings::{cosine_similarity, embed_all, mean_vector};
use crate::processing::gap_analyzer::{LearningPath, SkillGapAnalyzer};
use crate::processing::profile::{canonical_name, CandidateProfile, JobRequirements, SkillRequirement};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const NEUTRAL: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_match: f64,
    pub proficiency_match: f64,
    pub market_alignment: f64,
    pub learning_potential: f64,
    pub experience_match: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub total: f64,
    pub breakdown: ScoreBreakdown,
    pub gap_analysis: LearningPath,
    pub insights: Vec<String>,
}

pub struct MatchScorer {
    config: ScoringConfig,
    high_demand: u64,
    medium_demand: u64,
    aggregator: Arc<MarketDemandAggregator>,
    gaps: Arc<SkillGapAnalyzer>,
    reasoning: Arc<ReasoningClient>,
    embeddings: Option<Arc<dyn EmbeddingService>>,
}

impl MatchScorer {
    pub fn new(
        config: ScoringConfig,
        market: &MarketConfig,
        aggregator: Arc<MarketDemandAggregator>,
        gaps: Arc<SkillGapAnalyzer>,
        reasoning: Arc<ReasoningClient>,
    ) -> Self {
        Self {
            config,
            high_demand: market.high_demand_job_count,
            medium_demand: market.medium_demand_job_count,
            aggregator,
            gaps,
            reasoning,
            embeddings: None,
        }
    }

    /// Needed only when `semantic_blend_weight` is above zero
    pub fn with_embeddings(mut self, embeddings: Arc<dyn EmbeddingService>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Score a validated job against a validated candidate.
    ///
    /// Market data, relatedness and narrative enrichment degrade to their
    /// neutral values on failure; none of them abort the score.
    pub async fn score(&self, job: &JobRequirements, candidate: &CandidateProfile) -> MatchScore {
        info!("Scoring candidate '{}' against job '{}'", candidate.id, job.id);

        let mut market_skills = job.skill_names();
        for name in candidate.skill_names() {
            if !market_skills.contains(&name) {
                market_skills.push(name);
            }
        }

        // Gap relevance reads the signal cache, so aggregation has to land first
        let signals = self.aggregator.signals_for(&market_skills).await;
        let (gap_analysis, semantic) = tokio::join!(
            self.gaps.analyze(&candidate.skills, &job.skills),
            self.semantic_similarity(job, candidate),
        );

        let basic = self.skill_match(job, candidate);
        let skill_match = match semantic {
            Some(enhanced) => {
                let w = self.config.semantic_blend_weight;
                (1.0 - w) * basic + w * enhanced
            }
            None => basic,
        };

        let relatedness = self.relatedness(candidate, &gap_analysis).await;

        let breakdown = ScoreBreakdown {
            skill_match,
            proficiency_match: self.proficiency_match(job, candidate),
            market_alignment: self.market_alignment(job, candidate, &signals),
            learning_potential: self.learning_potential(job, candidate, &gap_analysis, relatedness),
            experience_match: experience_match(job, candidate),
        };

        let c = &self.config;
        let total = (breakdown.skill_match * c.skill_weight
            + breakdown.proficiency_match * c.proficiency_weight
            + breakdown.market_alignment * c.market_weight
            + breakdown.learning_potential * c.learning_weight
            + breakdown.experience_match * c.experience_weight)
            .clamp(0.0, 1.0);
        debug!("Score breakdown for '{}' vs '{}': {:?}", candidate.id, job.id, breakdown);

        let insights = self.insights(job, &breakdown, &gap_analysis).await;

        MatchScore {
            total,
            breakdown,
            gap_analysis,
            insights,
        }
    }

    /// Importance-weighted coverage of required and preferred skills.
    /// An empty group counts as fully covered.
    pub fn skill_match(&self, job: &JobRequirements, candidate: &CandidateProfile) -> f64 {
        let held = candidate.skill_map();
        let coverage = |skills: Vec<&SkillRequirement>| {
            let total: f64 = skills.iter().map(|s| s.importance).sum();
            if total <= 0.0 {
                return 1.0;
            }
            let matched: f64 = skills
                .iter()
                .filter(|s| held.contains_key(&canonical_name(&s.name)))
                .map(|s| s.importance)
                .sum();
            matched / total
        };

        let required = coverage(job.required_skills().collect());
        let preferred = coverage(job.preferred_skills().collect());
        let (rw, pw) = (self.config.required_weight, self.config.preferred_weight);
        if rw + pw <= 0.0 {
            return required;
        }
        (required * rw + preferred * pw) / (rw + pw)
    }

    /// Importance-weighted level fit over the job skills the candidate holds.
    /// Each level short costs half a point; 0 when nothing overlaps.
    pub fn proficiency_match(&self, job: &JobRequirements, candidate: &CandidateProfile) -> f64 {
        let held = candidate.skill_map();
        let mut score = 0.0;
        let mut weight = 0.0;

        for requirement in &job.skills {
            if let Some(skill) = held.get(&canonical_name(&requirement.name)) {
                let diff = skill.proficiency_level.ordinal() as f64 - requirement.proficiency_level.ordinal() as f64;
                let fit = if diff >= 0.0 { 1.0 } else { (1.0 + diff * 0.5).max(0.0) };
                score += fit * requirement.importance;
                weight += requirement.importance;
            }
        }

        if weight > 0.0 {
            score / weight
        } else {
            0.0
        }
    }

    /// How well the candidate's skills line up with market demand.
    ///
    /// Required skills the candidate holds contribute `score × trend × demand`
    /// weighted by importance; skills outside the job contribute with the
    /// smaller multipliers and a fixed weight. Neutral when no skill had a
    /// signal at all.
    pub fn market_alignment(
        &self,
        job: &JobRequirements,
        candidate: &CandidateProfile,
        signals: &HashMap<String, MarketSignal>,
    ) -> f64 {
        if signals.is_empty() {
            return NEUTRAL;
        }

        let m = &self.config.market_alignment;
        let held = candidate.skill_map();
        let job_skills: HashSet<String> = job.skill_names().into_iter().collect();
        let mut alignment = 0.0;
        let mut weight = 0.0;

        for requirement in &job.skills {
            let key = canonical_name(&requirement.name);
            if !held.contains_key(&key) {
                continue;
            }
            if let Some(signal) = signals.get(&key) {
                alignment += self.weighted_signal(signal, &m.held_trend, &m.held_demand) * requirement.importance;
                weight += requirement.importance;
            }
        }

        for name in candidate.skill_names() {
            if job_skills.contains(&name) {
                continue;
            }
            if let Some(signal) = signals.get(&name) {
                alignment += self.weighted_signal(signal, &m.extra_trend, &m.extra_demand);
                weight += m.extra_skill_weight;
            }
        }

        if weight > 0.0 {
            (alignment / weight).min(1.0)
        } else {
            0.0
        }
    }

    fn weighted_signal(&self, signal: &MarketSignal, trend: &TrendMultipliers, demand: &DemandMultipliers) -> f64 {
        let t = match signal.trend {
            Trend::Rising => trend.rising,
            Trend::Stable => trend.stable,
            Trend::Declining => trend.declining,
        };
        let d = match signal.demand_level(self.high_demand, self.medium_demand) {
            DemandLevel::High => demand.high,
            DemandLevel::Medium => demand.medium,
            DemandLevel::Low => demand.low,
        };
        signal.score * t * d
    }

    /// Additive blend of traits, path ease, progression, overlap and
    /// relatedness, clamped to [0, 1]
    pub fn learning_potential(
        &self,
        job: &JobRequirements,
        candidate: &CandidateProfile,
        path: &LearningPath,
        relatedness: f64,
    ) -> f64 {
        let l = &self.config.learning;

        let adaptability = candidate.adaptability_score.unwrap_or(NEUTRAL);
        let learning_speed = candidate.learning_speed.unwrap_or(NEUTRAL);
        let base = (adaptability + learning_speed) / 2.0;

        let progression = if candidate.skills.is_empty() {
            0.0
        } else {
            let total: f64 = candidate
                .skills
                .iter()
                .map(|s| s.proficiency_level.ordinal() as f64 * s.years_of_experience)
                .sum();
            (total / candidate.skills.len() as f64 * l.progression_coefficient).min(l.progression_cap)
        };

        let job_skills: HashSet<String> = job.skill_names().into_iter().collect();
        let held: HashSet<String> = candidate.skill_names().into_iter().collect();
        let overlap = if job_skills.is_empty() {
            0.0
        } else {
            job_skills.intersection(&held).count() as f64 / job_skills.len() as f64
        };

        let potential = base * l.base_weight
            + path.difficulty.ease() * l.difficulty_weight
            + progression
            + overlap * l.overlap_weight
            + relatedness * l.relatedness_weight;
        potential.clamp(0.0, 1.0)
    }

    async fn relatedness(&self, candidate: &CandidateProfile, path: &LearningPath) -> f64 {
        let missing: Vec<String> = path.gaps.iter().filter(|g| g.is_missing()).map(|g| g.skill.clone()).collect();
        if missing.is_empty() {
            return 1.0;
        }

        match self.reasoning.relatedness(&candidate.skills, &missing).await {
            Ok(score) => score,
            Err(e) => {
                warn!("Relatedness scoring failed, using neutral value: {}", e);
                NEUTRAL
            }
        }
    }

    /// Mapped cosine similarity of mean job and candidate skill embeddings
    async fn semantic_similarity(&self, job: &JobRequirements, candidate: &CandidateProfile) -> Option<f64> {
        if self.config.semantic_blend_weight <= 0.0 {
            return None;
        }
        let embeddings = self.embeddings.as_ref()?;

        let job_vectors: Vec<Vec<f32>> = embed_all(embeddings.as_ref(), &job.skill_names())
            .await
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let candidate_vectors: Vec<Vec<f32>> = embed_all(embeddings.as_ref(), &candidate.skill_names())
            .await
            .into_iter()
            .map(|(_, v)| v)
            .collect();

        let similarity = cosine_similarity(&mean_vector(&job_vectors)?, &mean_vector(&candidate_vectors)?);
        match similarity {
            Ok(cos) => Some(((cos as f64 + 1.0) / 2.0).clamp(0.0, 1.0)),
            Err(e) => {
                warn!("Semantic skill similarity unavailable: {}", e);
                None
            }
        }
    }

    async fn insights(&self, job: &JobRequirements, breakdown: &ScoreBreakdown, path: &LearningPath) -> Vec<String> {
        let params = InsightParams {
            job_title: job.title.clone(),
            skill_match: breakdown.skill_match,
            proficiency_match: breakdown.proficiency_match,
            market_alignment: breakdown.market_alignment,
            learning_potential: breakdown.learning_potential,
            experience_match: breakdown.experience_match,
            gaps: path
                .gaps
                .iter()
                .map(|g| (g.skill.clone(), g.time_to_acquire.clone()))
                .collect(),
        };

        match self.reasoning.match_insights(&params).await {
            Ok(insights) => insights,
            Err(e) => {
                warn!("Match insight generation failed: {}", e);
                vec![
                    "Unable to generate detailed insights due to an error.".to_string(),
                    "Please review the match scores and skill gaps manually.".to_string(),
                ]
            }
        }
    }
}

/// Relevant years over required years, capped at 1; neutral when either side
/// has no experience data
pub fn experience_match(job: &JobRequirements, candidate: &CandidateProfile) -> f64 {
    match (&job.experience, &candidate.experience) {
        (Some(required), Some(held)) => (held.relevant_years / required.years.max(1.0)).min(1.0),
        _ => NEUTRAL,
    }
}
