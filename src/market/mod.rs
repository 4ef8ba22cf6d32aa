//! Labor-market demand signals
//!
//! Source adapters report per-skill observations, the aggregator combines them
//! into a [`MarketSignal`] with renormalized weights, and the cache keeps the
//! result for a fixed TTL backed by the durable store.

pub mod aggregator;
pub mod cache;
pub mod insights;
pub mod sources;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use aggregator::MarketDemandAggregator;
pub use cache::{Clock, ManualClock, SignalCache, SystemClock};
pub use insights::{MarketInsightsGenerator, MarketInsightsReport};
pub use sources::{MarketSource, SourceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Rising,
    Stable,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Rising => write!(f, "RISING"),
            Trend::Stable => write!(f, "STABLE"),
            Trend::Declining => write!(f, "DECLINING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DemandLevel {
    High,
    Medium,
    Low,
}

impl DemandLevel {
    /// Bucket an aggregated job count
    pub fn from_job_count(job_count: u64, high_threshold: u64, medium_threshold: u64) -> Self {
        if job_count >= high_threshold {
            DemandLevel::High
        } else if job_count >= medium_threshold {
            DemandLevel::Medium
        } else {
            DemandLevel::Low
        }
    }
}

impl fmt::Display for DemandLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandLevel::High => write!(f, "HIGH"),
            DemandLevel::Medium => write!(f, "MEDIUM"),
            DemandLevel::Low => write!(f, "LOW"),
        }
    }
}

/// Source-combined demand and trend view for one skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignal {
    pub skill: String,
    pub trend: Trend,
    pub score: f64,
    pub job_count: u64,
    pub avg_salary: f64,
    pub sources: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl MarketSignal {
    pub fn demand_level(&self, high_threshold: u64, medium_threshold: u64) -> DemandLevel {
        DemandLevel::from_job_count(self.job_count, high_threshold, medium_threshold)
    }

    /// Whether the signal is still inside the TTL window at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_updated) < ttl
    }
}
