//! Report envelopes around engine results

use crate::engine::ProcessedJob;
use crate::market::insights::MarketInsightsReport;
use crate::market::MarketSignal;
use crate::processing::gap_analyzer::LearningPath;
use crate::processing::matcher::MatchScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Any engine result ready to be rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub body: ReportBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub version: String,
    /// Reasoning service that produced the narrative parts
    pub reasoning_service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ReportBody {
    Normalized(NormalizedSkills),
    Match(MatchReport),
    LearningPath(LearningPath),
    MarketSignal(MarketSignal),
    MarketInsights(MarketInsightsReport),
    Ingested(ProcessedJob),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSkills {
    pub input: Vec<String>,
    pub normalized: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub job_id: String,
    pub job_title: String,
    pub candidate_id: String,
    pub score: MatchScore,
}

impl MatchReport {
    /// Total score as a 0-100 percentage
    pub fn percentage(&self) -> u8 {
        percentage(self.score.total)
    }
}

impl Report {
    pub fn new(body: ReportBody, processing_time_ms: u64, reasoning_service: &str) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                processing_time_ms,
                version: env!("CARGO_PKG_VERSION").to_string(),
                reasoning_service: reasoning_service.to_string(),
            },
            body,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.body {
            ReportBody::Normalized(_) => "Normalized Skills",
            ReportBody::Match(_) => "Match Analysis",
            ReportBody::LearningPath(_) => "Learning Path",
            ReportBody::MarketSignal(_) => "Market Signal",
            ReportBody::MarketInsights(_) => "Market Insights",
            ReportBody::Ingested(_) => "Job Ingestion",
        }
    }
}

/// Clamp a unit score into a 0-100 percentage
pub fn percentage(score: f64) -> u8 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}
