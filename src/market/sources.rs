//! Pluggable market-source adapters

use crate::error::{Result, SkillAlignerError};
use crate::llm::analyzer::ReasoningClient;
use crate::market::Trend;
use crate::processing::profile::canonical_name;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Raw counts at or above this many postings map to a score of 1.0
pub const COUNT_SCALE: f64 = 10_000.0;

/// One adapter's observation for a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    pub score: f64,
    pub trend: Trend,
    #[serde(default)]
    pub job_count: Option<u64>,
    #[serde(default)]
    pub avg_salary: Option<f64>,
}

#[async_trait]
pub trait MarketSource: Send + Sync {
    fn id(&self) -> &str;

    /// Weight before renormalization over the sources that answered
    fn nominal_weight(&self) -> f64;

    /// `Ok(None)` when the source has nothing for this skill
    async fn fetch_signal(&self, skill: &str) -> Result<Option<SourceResult>>;
}

/// Scale a raw activity count into [0, 1]
pub fn normalize_count(count: f64) -> f64 {
    (count / COUNT_SCALE).clamp(0.0, 1.0)
}

/// Per-skill record in a snapshot file. Either `score` or a raw `count`
/// must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotRecord {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
    pub trend: Trend,
    #[serde(default)]
    pub job_count: Option<u64>,
    #[serde(default)]
    pub avg_salary: Option<f64>,
}

impl SnapshotRecord {
    fn to_result(&self) -> Option<SourceResult> {
        let score = match (self.score, self.count) {
            (Some(score), _) => score,
            (None, Some(count)) => normalize_count(count),
            (None, None) => return None,
        };
        Some(SourceResult {
            score,
            trend: self.trend,
            job_count: self.job_count,
            avg_salary: self.avg_salary,
        })
    }
}

/// Adapter serving a previously exported JSON snapshot:
/// `{ "<skill>": { "score" | "count", "trend", "job_count", "avg_salary" } }`
pub struct SnapshotSource {
    id: String,
    weight: f64,
    records: HashMap<String, SnapshotRecord>,
}

impl SnapshotSource {
    pub fn from_records(id: &str, weight: f64, records: HashMap<String, SnapshotRecord>) -> Result<Self> {
        let mut normalized = HashMap::with_capacity(records.len());
        for (skill, record) in records {
            if record.score.is_none() && record.count.is_none() {
                return Err(SkillAlignerError::InvalidInput(format!(
                    "snapshot '{}' entry '{}' has neither score nor count",
                    id, skill
                )));
            }
            if let Some(score) = record.score {
                if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                    return Err(SkillAlignerError::InvalidInput(format!(
                        "snapshot '{}' entry '{}' has score {} outside [0, 1]",
                        id, skill, score
                    )));
                }
            }
            normalized.insert(canonical_name(&skill), record);
        }

        Ok(Self {
            id: id.to_string(),
            weight,
            records: normalized,
        })
    }

    pub async fn load(id: &str, weight: f64, path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let records: HashMap<String, SnapshotRecord> = serde_json::from_str(&content)?;
        debug!("Loaded {} snapshot record(s) for source '{}' from {}", records.len(), id, path.display());
        Self::from_records(id, weight, records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl MarketSource for SnapshotSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn nominal_weight(&self) -> f64 {
        self.weight
    }

    async fn fetch_signal(&self, skill: &str) -> Result<Option<SourceResult>> {
        Ok(self
            .records
            .get(&canonical_name(skill))
            .and_then(SnapshotRecord::to_result))
    }
}

/// Adapter asking the reasoning service for a strict `{score, trend, confidence}` outlook
pub struct ReasoningMarketSource {
    id: String,
    weight: f64,
    client: Arc<ReasoningClient>,
}

impl ReasoningMarketSource {
    pub fn new(id: &str, weight: f64, client: Arc<ReasoningClient>) -> Self {
        Self {
            id: id.to_string(),
            weight,
            client,
        }
    }
}

#[async_trait]
impl MarketSource for ReasoningMarketSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn nominal_weight(&self) -> f64 {
        self.weight
    }

    async fn fetch_signal(&self, skill: &str) -> Result<Option<SourceResult>> {
        let outlook = self.client.market_outlook(skill).await?;
        Ok(Some(SourceResult {
            score: outlook.score,
            trend: outlook.trend,
            job_count: None,
            avg_salary: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::service::ReasoningTask;
    use crate::test_support::{client, ScriptedReasoner};

    fn record(score: Option<f64>, count: Option<f64>) -> SnapshotRecord {
        SnapshotRecord {
            score,
            count,
            trend: Trend::Rising,
            job_count: Some(1200),
            avg_salary: Some(120_000.0),
        }
    }

    #[test]
    fn test_normalize_count() {
        assert_eq!(normalize_count(5_000.0), 0.5);
        assert_eq!(normalize_count(25_000.0), 1.0);
        assert_eq!(normalize_count(-3.0), 0.0);
    }

    #[tokio::test]
    async fn test_snapshot_lookup_is_case_insensitive() {
        let mut records = HashMap::new();
        records.insert("Rust".to_string(), record(Some(0.8), None));
        records.insert("go".to_string(), record(None, Some(2_500.0)));
        let source = SnapshotSource::from_records("github", 0.2, records).unwrap();

        let rust = source.fetch_signal(" RUST ").await.unwrap().unwrap();
        assert_eq!(rust.score, 0.8);
        assert_eq!(rust.job_count, Some(1200));

        let go = source.fetch_signal("go").await.unwrap().unwrap();
        assert_eq!(go.score, 0.25);

        assert!(source.fetch_signal("cobol").await.unwrap().is_none());
    }

    #[test]
    fn test_snapshot_rejects_bad_records() {
        let mut records = HashMap::new();
        records.insert("rust".to_string(), record(None, None));
        assert!(SnapshotSource::from_records("github", 0.2, records).is_err());

        let mut records = HashMap::new();
        records.insert("rust".to_string(), record(Some(3.0), None));
        assert!(SnapshotSource::from_records("github", 0.2, records).is_err());
    }

    #[tokio::test]
    async fn test_snapshot_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indeed.json");
        std::fs::write(
            &path,
            r#"{"react": {"score": 0.9, "trend": "RISING", "job_count": 4200, "avg_salary": 135000}}"#,
        )
        .unwrap();

        let source = SnapshotSource::load("indeed", 0.25, &path).await.unwrap();
        assert_eq!(source.len(), 1);
        let react = source.fetch_signal("React").await.unwrap().unwrap();
        assert_eq!(react.trend, Trend::Rising);
    }

    #[tokio::test]
    async fn test_reasoning_source_uses_strict_outlook() {
        let reasoner = ScriptedReasoner::new().respond(
            ReasoningTask::MarketOutlook,
            r#"{"score": 0.7, "trend": "STABLE", "confidence": 0.6}"#,
        );
        let source = ReasoningMarketSource::new("ai", 0.1, client(reasoner));

        let result = source.fetch_signal("rust").await.unwrap().unwrap();
        assert_eq!(result.score, 0.7);
        assert_eq!(result.trend, Trend::Stable);
        assert_eq!(result.job_count, None);
    }
}
