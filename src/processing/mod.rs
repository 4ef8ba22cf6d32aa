//! Skill analysis: normalization, gaps, clustering and match scoring

pub mod cluster;
pub mod duration;
pub mod embeddings;
pub mod gap_analyzer;
pub mod matcher;
pub mod normalizer;
pub mod profile;
pub mod taxonomy;

pub use cluster::{ClusterAnalyzer, SkillCluster};
pub use gap_analyzer::{LearningPath, SkillGap, SkillGapAnalyzer};
pub use matcher::{MatchScore, MatchScorer};
pub use normalizer::SkillNormalizer;
