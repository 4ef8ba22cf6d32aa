//! k-means grouping of skill embeddings and cluster labeling

use crate::config::ClusteringConfig;
use crate::llm::analyzer::ReasoningClient;
use crate::market::{MarketSignal, Trend};
use crate::processing::taxonomy::UNCATEGORIZED;
use futures::future::join_all;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster index for every input point
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
    pub iterations: usize,
}

impl KMeansResult {
    /// Point indices grouped per cluster; empty clusters are kept as empty lists
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.centroids.len()];
        for (point, &cluster) in self.assignments.iter().enumerate() {
            members[cluster].push(point);
        }
        members
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn nearest(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = euclidean_distance(point, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

/// Standard k-means over equal-length points.
///
/// Centroids start at `k` distinct randomly chosen points (`k` is clamped to
/// the number of points). Each round reassigns every point to its nearest
/// centroid and moves centroids to the mean of their members; a centroid
/// with no members stays put. Stops once every centroid moves less than
/// `epsilon`, or after `max_iterations` rounds.
pub fn kmeans<R: Rng>(points: &[Vec<f32>], k: usize, max_iterations: usize, epsilon: f64, rng: &mut R) -> KMeansResult {
    let k = k.min(points.len());
    if k == 0 {
        return KMeansResult {
            assignments: Vec::new(),
            centroids: Vec::new(),
            iterations: 0,
        };
    }

    let mut centroids: Vec<Vec<f32>> = rand::seq::index::sample(rng, points.len(), k)
        .into_iter()
        .map(|i| points[i].clone())
        .collect();
    let mut assignments = vec![0; points.len()];
    let mut iterations = 0;

    while iterations < max_iterations {
        for (point, slot) in points.iter().zip(assignments.iter_mut()) {
            *slot = nearest(point, &centroids);
        }

        let dims = centroids[0].len();
        let mut sums = vec![vec![0.0f64; dims]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.iter().zip(&assignments) {
            counts[cluster] += 1;
            for (acc, value) in sums[cluster].iter_mut().zip(point) {
                *acc += *value as f64;
            }
        }

        let updated: Vec<Vec<f32>> = centroids
            .iter()
            .enumerate()
            .map(|(i, previous)| {
                if counts[i] == 0 {
                    previous.clone()
                } else {
                    sums[i].iter().map(|s| (s / counts[i] as f64) as f32).collect()
                }
            })
            .collect();

        let converged = centroids
            .iter()
            .zip(&updated)
            .all(|(old, new)| euclidean_distance(old, new) < epsilon);

        centroids = updated;
        iterations += 1;
        if converged {
            break;
        }
    }

    KMeansResult {
        assignments,
        centroids,
        iterations,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCluster {
    pub category: String,
    pub skills: Vec<String>,
    /// Mean market score over members that have a signal
    pub market_demand: f64,
    /// (rising − declining) / members with a signal
    pub growth_rate: f64,
}

pub struct ClusterAnalyzer {
    reasoning: Arc<ReasoningClient>,
    config: ClusteringConfig,
}

impl ClusterAnalyzer {
    pub fn new(reasoning: Arc<ReasoningClient>, config: ClusteringConfig) -> Self {
        Self { reasoning, config }
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Group embedded skills and label each non-empty group
    pub async fn cluster(
        &self,
        embedded: &[(String, Vec<f32>)],
        signals: &HashMap<String, MarketSignal>,
    ) -> Vec<SkillCluster> {
        if embedded.is_empty() {
            return Vec::new();
        }

        let points: Vec<Vec<f32>> = embedded.iter().map(|(_, v)| v.clone()).collect();
        let result = kmeans(
            &points,
            self.config.k,
            self.config.max_iterations,
            self.config.epsilon,
            &mut self.rng(),
        );
        debug!(
            "k-means placed {} skill(s) into {} cluster(s) in {} iteration(s)",
            points.len(),
            result.centroids.len(),
            result.iterations
        );

        let groups: Vec<Vec<String>> = result
            .members()
            .into_iter()
            .filter(|members| !members.is_empty())
            .map(|members| members.into_iter().map(|i| embedded[i].0.clone()).collect())
            .collect();

        let labels = join_all(groups.iter().map(|skills| self.label(skills))).await;

        let mut clusters: Vec<SkillCluster> = groups
            .into_iter()
            .zip(labels)
            .map(|(skills, category)| {
                let (market_demand, growth_rate) = cluster_statistics(&skills, signals);
                SkillCluster {
                    category,
                    skills,
                    market_demand,
                    growth_rate,
                }
            })
            .collect();

        clusters.sort_by(|a, b| b.skills.len().cmp(&a.skills.len()).then_with(|| a.category.cmp(&b.category)));
        clusters
    }

    async fn label(&self, skills: &[String]) -> String {
        match self.reasoning.categorize_cluster(skills).await {
            Ok(label) => label,
            Err(e) => {
                warn!("Cluster labeling failed, using '{}': {}", UNCATEGORIZED, e);
                UNCATEGORIZED.to_string()
            }
        }
    }
}

/// (market demand, growth rate) for a group of skills
pub fn cluster_statistics(skills: &[String], signals: &HashMap<String, MarketSignal>) -> (f64, f64) {
    let with_signal: Vec<&MarketSignal> = skills.iter().filter_map(|s| signals.get(s)).collect();
    if with_signal.is_empty() {
        return (0.0, 0.0);
    }

    let n = with_signal.len() as f64;
    let demand = with_signal.iter().map(|s| s.score).sum::<f64>() / n;
    let rising = with_signal.iter().filter(|s| s.trend == Trend::Rising).count() as f64;
    let declining = with_signal.iter().filter(|s| s.trend == Trend::Declining).count() as f64;
    (demand, (rising - declining) / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::service::ReasoningTask;
    use crate::test_support::{client, ScriptedReasoner};
    use chrono::Utc;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    fn signal(skill: &str, score: f64, trend: Trend) -> MarketSignal {
        MarketSignal {
            skill: skill.to_string(),
            trend,
            score,
            job_count: 0,
            avg_salary: 0.0,
            sources: vec!["github".to_string()],
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let points = two_blobs();
        let result = kmeans(&points, 2, 100, 0.001, &mut seeded());

        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[0], result.assignments[2]);
        assert_eq!(result.assignments[3], result.assignments[4]);
        assert_ne!(result.assignments[0], result.assignments[3]);
        assert!(result.iterations <= 100);
    }

    #[test]
    fn test_kmeans_clamps_k_and_handles_empty() {
        let points = vec![vec![1.0], vec![2.0]];
        let result = kmeans(&points, 5, 100, 0.001, &mut seeded());
        assert_eq!(result.centroids.len(), 2);

        let empty = kmeans(&[], 3, 100, 0.001, &mut seeded());
        assert!(empty.centroids.is_empty());
        assert!(empty.assignments.is_empty());
    }

    #[test]
    fn test_kmeans_respects_iteration_cap() {
        let result = kmeans(&two_blobs(), 2, 1, 0.0, &mut seeded());
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_cluster_statistics() {
        let mut signals = HashMap::new();
        signals.insert("react".to_string(), signal("react", 0.9, Trend::Rising));
        signals.insert("vue".to_string(), signal("vue", 0.8, Trend::Stable));
        signals.insert("angular".to_string(), signal("angular", 0.4, Trend::Declining));
        signals.insert("svelte".to_string(), signal("svelte", 0.5, Trend::Rising));

        let skills = vec!["react".to_string(), "vue".to_string(), "svelte".to_string(), "ember".to_string()];
        let (demand, growth) = cluster_statistics(&skills, &signals);
        assert!((demand - (0.9 + 0.8 + 0.5) / 3.0).abs() < 1e-9);
        assert!((growth - 2.0 / 3.0).abs() < 1e-9);

        assert_eq!(cluster_statistics(&["ember".to_string()], &signals), (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_cluster_labels_with_fallback() {
        let reasoner = ScriptedReasoner::new().respond_for(ReasoningTask::ClusterLabel, "react", "Frontend Development");
        let config = ClusteringConfig {
            k: 2,
            seed: Some(3),
            ..ClusteringConfig::default()
        };
        let analyzer = ClusterAnalyzer::new(client(reasoner), config);

        let names = ["react", "vue", "css", "postgresql", "mysql", "redis"];
        let embedded: Vec<(String, Vec<f32>)> = names
            .iter()
            .zip(two_blobs())
            .map(|(n, v)| (n.to_string(), v))
            .collect();

        let clusters = analyzer.cluster(&embedded, &HashMap::new()).await;
        assert_eq!(clusters.len(), 2);
        let categories: Vec<&str> = clusters.iter().map(|c| c.category.as_str()).collect();
        assert!(categories.contains(&"Frontend Development"));
        assert!(categories.contains(&"Uncategorized"));
    }
}
