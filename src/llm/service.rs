//! Ports to the external reasoning, embedding and vector-index services

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// What a reasoning request is for, so implementations can route or stub it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasoningTask {
    NormalizeSkills,
    GapEnrichment,
    Relatedness,
    ClusterLabel,
    MatchInsights,
    MarketRecommendations,
    MarketOutlook,
}

impl ReasoningTask {
    pub fn label(self) -> &'static str {
        match self {
            ReasoningTask::NormalizeSkills => "normalize-skills",
            ReasoningTask::GapEnrichment => "gap-enrichment",
            ReasoningTask::Relatedness => "relatedness",
            ReasoningTask::ClusterLabel => "cluster-label",
            ReasoningTask::MatchInsights => "match-insights",
            ReasoningTask::MarketRecommendations => "market-recommendations",
            ReasoningTask::MarketOutlook => "market-outlook",
        }
    }
}

/// Prompt in, text out. `inputs` carries the structured values the prompt was
/// rendered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub task: ReasoningTask,
    pub system: String,
    pub prompt: String,
    pub inputs: Vec<String>,
    pub temperature: f32,
    pub max_tokens: usize,
}

#[async_trait]
pub trait ReasoningService: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &PromptRequest) -> Result<String>;
}

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, id: &str, vector: &[f32], metadata: HashMap<String, String>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    pub vector: Vec<f32>,
    pub metadata: HashMap<String, String>,
}

/// In-process vector index
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    entries: RwLock<HashMap<String, VectorEntry>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<VectorEntry> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, id: &str, vector: &[f32], metadata: HashMap<String, String>) -> Result<()> {
        self.entries.write().await.insert(
            id.to_string(),
            VectorEntry {
                vector: vector.to_vec(),
                metadata,
            },
        );
        Ok(())
    }
}
