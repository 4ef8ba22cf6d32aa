//! Configuration management for the skill aligner

use crate::error::{Result, SkillAlignerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub market: MarketConfig,
    pub reasoning: ReasoningConfig,
    pub clustering: ClusteringConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
}

/// Weights and constants used by the match scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub skill_weight: f64,
    pub proficiency_weight: f64,
    pub market_weight: f64,
    pub learning_weight: f64,
    pub experience_weight: f64,

    /// Relative weights of required vs preferred coverage inside skill match
    pub required_weight: f64,
    pub preferred_weight: f64,

    /// Share of the embedding-derived coverage blended into skill match
    pub semantic_blend_weight: f64,

    pub market_alignment: MarketAlignmentConfig,
    pub learning: LearningPotentialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAlignmentConfig {
    pub held_trend: TrendMultipliers,
    pub held_demand: DemandMultipliers,
    pub extra_trend: TrendMultipliers,
    pub extra_demand: DemandMultipliers,
    pub extra_skill_weight: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendMultipliers {
    pub rising: f64,
    pub stable: f64,
    pub declining: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DemandMultipliers {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPotentialConfig {
    pub base_weight: f64,
    pub difficulty_weight: f64,
    pub progression_coefficient: f64,
    pub progression_cap: f64,
    pub overlap_weight: f64,
    pub relatedness_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub cache_ttl_hours: i64,
    pub source_timeout_secs: u64,
    pub high_demand_job_count: u64,
    pub medium_demand_job_count: u64,
    pub emerging_limit: usize,
    pub sources: Vec<SourceConfig>,
}

/// A market-source adapter and its nominal weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub weight: f64,
    /// Snapshot file backing the adapter; `None` for the reasoning-backed source
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    pub k: usize,
    pub max_iterations: usize,
    pub epsilon: f64,
    pub seed: Option<u64>,
    pub embedding_dimensions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.5,
            proficiency_weight: 0.1875,
            market_weight: 0.125,
            learning_weight: 0.125,
            experience_weight: 0.0625,
            required_weight: 0.4,
            preferred_weight: 0.2,
            semantic_blend_weight: 0.0,
            market_alignment: MarketAlignmentConfig {
                held_trend: TrendMultipliers { rising: 1.2, stable: 1.0, declining: 0.8 },
                held_demand: DemandMultipliers { high: 1.2, medium: 1.0, low: 0.8 },
                extra_trend: TrendMultipliers { rising: 0.5, stable: 0.3, declining: 0.1 },
                extra_demand: DemandMultipliers { high: 0.5, medium: 0.3, low: 0.1 },
                extra_skill_weight: 0.5,
            },
            learning: LearningPotentialConfig {
                base_weight: 0.4,
                difficulty_weight: 0.2,
                progression_coefficient: 0.05,
                progression_cap: 0.2,
                overlap_weight: 0.2,
                relatedness_weight: 0.2,
            },
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        let source = |id: &str, weight: f64, snapshot: Option<&str>| SourceConfig {
            id: id.to_string(),
            weight,
            snapshot: snapshot.map(PathBuf::from),
        };

        Self {
            cache_ttl_hours: 24,
            source_timeout_secs: 10,
            high_demand_job_count: 1000,
            medium_demand_job_count: 100,
            emerging_limit: 10,
            sources: vec![
                source("github", 0.2, Some("market/github.json")),
                source("stackoverflow", 0.2, Some("market/stackoverflow.json")),
                source("linkedin", 0.25, Some("market/linkedin.json")),
                source("indeed", 0.25, Some("market/indeed.json")),
                source("ai", 0.1, None),
            ],
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            timeout_secs: 30,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: 5,
            max_iterations: 100,
            epsilon: 0.001,
            seed: None,
            embedding_dimensions: 64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".skill-aligner");

        Self {
            scoring: ScoringConfig::default(),
            market: MarketConfig::default(),
            reasoning: ReasoningConfig::default(),
            clustering: ClusteringConfig::default(),
            storage: StorageConfig { data_dir },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load and validate a configuration file at an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| SkillAlignerError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SkillAlignerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("skill-aligner")
            .join("config.toml")
    }

    /// Reject weight sets and limits the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        let weights = [
            ("scoring.skill_weight", s.skill_weight),
            ("scoring.proficiency_weight", s.proficiency_weight),
            ("scoring.market_weight", s.market_weight),
            ("scoring.learning_weight", s.learning_weight),
            ("scoring.experience_weight", s.experience_weight),
            ("scoring.required_weight", s.required_weight),
            ("scoring.preferred_weight", s.preferred_weight),
            ("scoring.semantic_blend_weight", s.semantic_blend_weight),
        ];
        for (key, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(SkillAlignerError::Configuration(format!(
                    "{} must be a non-negative number, got {}", key, value
                )));
            }
        }

        let total = s.skill_weight + s.proficiency_weight + s.market_weight + s.learning_weight + s.experience_weight;
        if (total - 1.0).abs() > 1e-6 {
            return Err(SkillAlignerError::Configuration(format!(
                "Score component weights must sum to 1, got {:.4}", total
            )));
        }
        if s.required_weight + s.preferred_weight <= 0.0 {
            return Err(SkillAlignerError::Configuration(
                "Required and preferred weights cannot both be zero".to_string(),
            ));
        }
        if s.semantic_blend_weight > 1.0 {
            return Err(SkillAlignerError::Configuration(
                "scoring.semantic_blend_weight must be within [0, 1]".to_string(),
            ));
        }
        if self.market.sources.iter().any(|src| !src.weight.is_finite() || src.weight < 0.0) {
            return Err(SkillAlignerError::Configuration(
                "Market source weights must be non-negative".to_string(),
            ));
        }
        if self.market.cache_ttl_hours <= 0 {
            return Err(SkillAlignerError::Configuration(
                "market.cache_ttl_hours must be positive".to_string(),
            ));
        }
        if self.reasoning.max_attempts == 0 {
            return Err(SkillAlignerError::Configuration(
                "reasoning.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.clustering.k == 0 || self.clustering.max_iterations == 0 {
            return Err(SkillAlignerError::Configuration(
                "clustering.k and clustering.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.clustering.embedding_dimensions == 0 {
            return Err(SkillAlignerError::Configuration(
                "clustering.embedding_dimensions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.market.cache_ttl_hours)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.market.source_timeout_secs)
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.storage.data_dir
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.data_dir)?;
        Ok(())
    }

    /// Resolve a snapshot path relative to the data directory
    pub fn resolve_snapshot(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.storage.data_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.market.cache_ttl_hours, 24);
        assert_eq!(config.reasoning.max_attempts, 3);
        assert_eq!(config.clustering.max_iterations, 100);
    }

    #[test]
    fn test_default_source_weights_sum_to_one() {
        let config = Config::default();
        let total: f64 = config.market.sources.iter().map(|s| s.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let mut config = Config::default();
        config.scoring.skill_weight = 0.9;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SkillAlignerError::Configuration(_)));
    }

    #[test]
    fn test_rejects_zero_k() {
        let mut config = Config::default();
        config.clustering.k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_keeps_sources() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.market.sources.len(), 5);
        assert_eq!(parsed.market.sources[4].id, "ai");
        assert!(parsed.market.sources[4].snapshot.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.clustering.k = 3;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.clustering.k, 3);
    }
}
