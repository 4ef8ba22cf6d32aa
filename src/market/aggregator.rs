//! Concurrent multi-source demand aggregation

use crate::error::{Result, SkillAlignerError};
use crate::market::cache::SignalCache;
use crate::market::sources::{MarketSource, SourceResult};
use crate::market::{MarketSignal, Trend};
use crate::processing::profile::canonical_name;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A usable answer from one source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub source: String,
    pub weight: f64,
    pub result: SourceResult,
}

pub struct MarketDemandAggregator {
    sources: Vec<Arc<dyn MarketSource>>,
    cache: Arc<SignalCache>,
    source_timeout: Duration,
}

impl MarketDemandAggregator {
    pub fn new(sources: Vec<Arc<dyn MarketSource>>, cache: Arc<SignalCache>, source_timeout: Duration) -> Self {
        Self {
            sources,
            cache,
            source_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<SignalCache> {
        &self.cache
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    /// Combined market signal for one skill.
    ///
    /// Served from the cache while fresh. Otherwise every source is queried
    /// concurrently; sources that fail, time out or have no data are left out.
    /// Fails with `NoDataAvailable` when no source answered.
    pub async fn aggregate(&self, skill: &str) -> Result<MarketSignal> {
        let key = canonical_name(skill);
        if key.is_empty() {
            return Err(SkillAlignerError::InvalidInput("skill name is empty".to_string()));
        }

        // Check cache first
        if let Some(signal) = self.cache.peek(&key).await {
            return Ok(signal);
        }

        let reports: Vec<SourceReport> = join_all(self.sources.iter().map(|source| self.query(source.as_ref(), &key)))
            .await
            .into_iter()
            .flatten()
            .collect();

        if reports.is_empty() {
            warn!("No market source produced data for '{}'", key);
            return Err(SkillAlignerError::NoDataAvailable { skill: key });
        }

        let signal = combine(&key, &reports, self.cache.now());
        info!(
            "Aggregated '{}' from {}/{} source(s): score {:.3}, {}",
            key,
            reports.len(),
            self.sources.len(),
            signal.score,
            signal.trend
        );

        if let Err(e) = self.cache.put(signal.clone()).await {
            warn!("Persisting market signal for '{}' failed: {}", key, e);
        }
        Ok(signal)
    }

    /// Aggregate several skills concurrently, keeping each outcome
    pub async fn aggregate_many(&self, skills: &[String]) -> Vec<(String, Result<MarketSignal>)> {
        let outcomes = join_all(skills.iter().map(|skill| self.aggregate(skill))).await;
        skills.iter().map(|s| canonical_name(s)).zip(outcomes).collect()
    }

    /// Signals for the skills that could be aggregated; failures are logged and skipped
    pub async fn signals_for(&self, skills: &[String]) -> HashMap<String, MarketSignal> {
        self.aggregate_many(skills)
            .await
            .into_iter()
            .filter_map(|(skill, outcome)| match outcome {
                Ok(signal) => Some((skill, signal)),
                Err(e) => {
                    debug!("No market signal for '{}': {}", skill, e);
                    None
                }
            })
            .collect()
    }

    async fn query(&self, source: &dyn MarketSource, skill: &str) -> Option<SourceReport> {
        let outcome = tokio::time::timeout(self.source_timeout, source.fetch_signal(skill)).await;
        match outcome {
            Ok(Ok(Some(result))) if result.score.is_finite() => Some(SourceReport {
                source: source.id().to_string(),
                weight: source.nominal_weight().max(0.0),
                result: SourceResult {
                    score: result.score.clamp(0.0, 1.0),
                    ..result
                },
            }),
            Ok(Ok(Some(_))) => {
                warn!("Source '{}' returned a non-finite score for '{}'; excluding it", source.id(), skill);
                None
            }
            Ok(Ok(None)) => {
                debug!("Source '{}' has no data for '{}'", source.id(), skill);
                None
            }
            Ok(Err(e)) => {
                warn!("Source '{}' failed for '{}': {}", source.id(), skill, e);
                None
            }
            Err(_) => {
                warn!("Source '{}' timed out after {:?} for '{}'", source.id(), self.source_timeout, skill);
                None
            }
        }
    }
}

/// Weighted combination of the reporting sources.
///
/// Weights are renormalized over `reports` (equal shares if they are all
/// zero). Job counts add up, salaries average over the sources that gave one.
pub fn combine(skill: &str, reports: &[SourceReport], now: DateTime<Utc>) -> MarketSignal {
    let total_weight: f64 = reports.iter().map(|r| r.weight).sum();
    let score = if total_weight > 0.0 {
        reports.iter().map(|r| r.result.score * r.weight / total_weight).sum::<f64>()
    } else {
        reports.iter().map(|r| r.result.score).sum::<f64>() / reports.len() as f64
    };

    let job_count = reports.iter().filter_map(|r| r.result.job_count).sum();
    let salaries: Vec<f64> = reports
        .iter()
        .filter_map(|r| r.result.avg_salary)
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    let avg_salary = if salaries.is_empty() {
        0.0
    } else {
        salaries.iter().sum::<f64>() / salaries.len() as f64
    };

    MarketSignal {
        skill: skill.to_string(),
        trend: dominant_trend(reports.iter().map(|r| r.result.trend)),
        score: score.clamp(0.0, 1.0),
        job_count,
        avg_salary,
        sources: reports.iter().map(|r| r.source.clone()).collect(),
        last_updated: now,
    }
}

/// Majority vote; a trend wins only with a strictly larger count than every
/// other trend, any tie resolves to STABLE
pub fn dominant_trend(trends: impl IntoIterator<Item = Trend>) -> Trend {
    let mut counts: HashMap<Trend, usize> = HashMap::new();
    for trend in trends {
        *counts.entry(trend).or_insert(0) += 1;
    }

    let Some(&best) = counts.values().max() else {
        return Trend::Stable;
    };
    let mut leaders = counts.iter().filter(|&(_, &count)| count == best).map(|(&trend, _)| trend);
    match (leaders.next(), leaders.next()) {
        (Some(trend), None) => trend,
        _ => Trend::Stable,
    }
}
