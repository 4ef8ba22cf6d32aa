//! Corpus-wide market report: trend buckets, emerging skills, clusters and
//! strategic recommendations

use crate::error::Result;
use crate::input::store::SkillStore;
use crate::llm::analyzer::ReasoningClient;
use crate::llm::prompts::RecommendationParams;
use crate::llm::service::EmbeddingService;
use crate::market::cache::SignalCache;
use crate::market::{DemandLevel, MarketSignal, Trend};
use crate::processing::cluster::{ClusterAnalyzer, SkillCluster};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketTrends {
    pub rising: Vec<String>,
    pub stable: Vec<String>,
    pub declining: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInsightsReport {
    pub trends: MarketTrends,
    pub emerging_skills: Vec<String>,
    pub clusters: Vec<SkillCluster>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

pub struct MarketInsightsGenerator {
    store: Arc<dyn SkillStore>,
    cache: Arc<SignalCache>,
    clusters: Arc<ClusterAnalyzer>,
    reasoning: Arc<ReasoningClient>,
    embeddings: Option<Arc<dyn EmbeddingService>>,
    emerging_limit: usize,
    high_demand: u64,
    medium_demand: u64,
}

impl MarketInsightsGenerator {
    pub fn new(
        store: Arc<dyn SkillStore>,
        cache: Arc<SignalCache>,
        clusters: Arc<ClusterAnalyzer>,
        reasoning: Arc<ReasoningClient>,
    ) -> Self {
        Self {
            store,
            cache,
            clusters,
            reasoning,
            embeddings: None,
            emerging_limit: 10,
            high_demand: 1000,
            medium_demand: 100,
        }
    }

    /// Embed stored skills that were saved without a vector
    pub fn with_embeddings(mut self, embeddings: Arc<dyn EmbeddingService>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn with_emerging_limit(mut self, limit: usize) -> Self {
        self.emerging_limit = limit;
        self
    }

    pub fn with_demand_thresholds(mut self, high: u64, medium: u64) -> Self {
        self.high_demand = high;
        self.medium_demand = medium;
        self
    }

    /// Build the report over every stored skill. Only cached signals are
    /// consulted; nothing is fetched from the market sources. A store
    /// failure is returned, reasoning failures fall back.
    pub async fn generate(&self) -> Result<MarketInsightsReport> {
        let skills = self.store.list_skills().await?;
        info!("Generating market insights over {} stored skill(s)", skills.len());

        let mut signals: HashMap<String, MarketSignal> = HashMap::new();
        for skill in &skills {
            if let Some(signal) = self.cache.peek(&skill.name).await {
                signals.insert(skill.name.clone(), signal);
            }
        }
        debug!("{} of {} skill(s) have a fresh market signal", signals.len(), skills.len());

        let trends = bucket_trends(&signals);
        let emerging_skills = self.emerging(&signals);

        let mut embedded = Vec::with_capacity(skills.len());
        for skill in skills {
            match (skill.embedding, &self.embeddings) {
                (Some(vector), _) => embedded.push((skill.name, vector)),
                (None, Some(service)) => match service.embed(&skill.name).await {
                    Ok(vector) => embedded.push((skill.name, vector)),
                    Err(e) => warn!("Leaving '{}' out of clustering: {}", skill.name, e),
                },
                (None, None) => debug!("'{}' has no embedding; not clustered", skill.name),
            }
        }
        let clusters = self.clusters.cluster(&embedded, &signals).await;

        let params = RecommendationParams {
            rising: trends.rising.clone(),
            stable: trends.stable.clone(),
            declining: trends.declining.clone(),
            emerging: emerging_skills.clone(),
            clusters: clusters.iter().map(|c| (c.category.clone(), c.skills.clone())).collect(),
        };
        let recommendations = match self.reasoning.market_recommendations(&params).await {
            Ok(recommendations) => recommendations,
            Err(e) => {
                warn!("Recommendation generation failed: {}", e);
                vec![
                    "Error generating recommendations. Please try again later.".to_string(),
                    "Review the market trends manually to make informed decisions.".to_string(),
                ]
            }
        };

        Ok(MarketInsightsReport {
            trends,
            emerging_skills,
            clusters,
            recommendations,
            generated_at: self.cache.now(),
        })
    }

    /// Rising skills that have not reached high demand yet, strongest first
    fn emerging(&self, signals: &HashMap<String, MarketSignal>) -> Vec<String> {
        let mut candidates: Vec<(&String, &MarketSignal)> = signals
            .iter()
            .filter(|(_, s)| s.trend == Trend::Rising)
            .filter(|(_, s)| s.demand_level(self.high_demand, self.medium_demand) != DemandLevel::High)
            .collect();
        candidates.sort_by(|a, b| b.1.score.total_cmp(&a.1.score).then_with(|| a.0.cmp(b.0)));
        candidates
            .into_iter()
            .take(self.emerging_limit)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Split skills by trend, each list by score descending
pub fn bucket_trends(signals: &HashMap<String, MarketSignal>) -> MarketTrends {
    let mut ranked: Vec<(&String, &MarketSignal)> = signals.iter().collect();
    ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score).then_with(|| a.0.cmp(b.0)));

    let mut trends = MarketTrends::default();
    for (name, signal) in ranked {
        let bucket = match signal.trend {
            Trend::Rising => &mut trends.rising,
            Trend::Stable => &mut trends.stable,
            Trend::Declining => &mut trends.declining,
        };
        bucket.push(name.clone());
    }
    trends
}
