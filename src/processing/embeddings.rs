//! Skill-name embeddings and vector helpers

use crate::error::{Result, SkillAlignerError};
use crate::llm::service::EmbeddingService;
use crate::processing::profile::canonical_name;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tokio::sync::RwLock;

/// Deterministic character-trigram hashing embedder.
///
/// Names that share spelling share buckets, which is enough to place
/// "react" near "react native" without a model download.
pub struct HashingEmbedder {
    dimensions: usize,
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let padded: Vec<char> = format!("  {} ", canonical_name(text)).chars().collect();

        for window in padded.windows(3) {
            let mut hasher = DefaultHasher::new();
            window.hash(&mut hasher);
            let hash = hasher.finish();
            let bucket = (hash % self.dimensions as u64) as usize;
            // One hash bit picks the sign to spread collisions
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl EmbeddingService for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = canonical_name(text);
        if key.is_empty() {
            return Err(SkillAlignerError::InvalidInput("cannot embed an empty skill name".to_string()));
        }

        // Check cache first
        if let Some(vector) = self.cache.read().await.get(&key) {
            return Ok(vector.clone());
        }

        let vector = self.encode(&key);
        self.cache.write().await.insert(key, vector.clone());
        Ok(vector)
    }
}

/// Cosine similarity of two equal-length vectors; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SkillAlignerError::InvalidInput(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

/// Per-dimension mean; `None` for an empty set or mismatched lengths
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dims = first.len();
    if vectors.iter().any(|v| v.len() != dims) {
        return None;
    }

    let mut mean = vec![0.0f32; dims];
    for vector in vectors {
        for (acc, value) in mean.iter_mut().zip(vector) {
            *acc += value;
        }
    }
    let count = vectors.len() as f32;
    mean.iter_mut().for_each(|x| *x /= count);
    Some(mean)
}

/// Embed every name, skipping the ones the service rejects
pub async fn embed_all(service: &dyn EmbeddingService, names: &[String]) -> Vec<(String, Vec<f32>)> {
    let mut embedded = Vec::with_capacity(names.len());
    for name in names {
        match service.embed(name).await {
            Ok(vector) => embedded.push((name.clone(), vector)),
            Err(e) => log::warn!("Skipping embedding for '{}': {}", name, e),
        }
    }
    embedded
}
