//! Strict parsing of reasoning-service responses
//!
//! Every response is validated against the shape the caller needs; anything
//! else becomes [`SkillAlignerError::SchemaMismatch`] instead of a guess.

use crate::error::{Result, SkillAlignerError};
use crate::market::Trend;
use crate::processing::gap_analyzer::LearningResource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Learning requirements for one gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GapEnrichment {
    pub time_to_acquire: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub resources: Vec<LearningResource>,
}

/// Reasoning-derived market view of a single skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketOutlook {
    pub score: f64,
    pub trend: Trend,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Strip a surrounding markdown code fence, if any
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_json<T: DeserializeOwned>(text: &str, expected: &'static str) -> Result<T> {
    serde_json::from_str(unfence(text)).map_err(|e| SkillAlignerError::schema(expected, e.to_string()))
}

fn check_unit_interval(value: f64, expected: &'static str) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SkillAlignerError::schema(expected, format!("{} is outside [0, 1]", value)))
    }
}

/// A non-empty JSON array of non-blank strings
pub fn parse_string_list(text: &str) -> Result<Vec<String>> {
    const EXPECTED: &str = "JSON array of strings";
    let items: Vec<String> = parse_json(text, EXPECTED)?;
    if items.is_empty() {
        return Err(SkillAlignerError::schema(EXPECTED, "array is empty"));
    }
    if items.iter().any(|item| item.trim().is_empty()) {
        return Err(SkillAlignerError::schema(EXPECTED, "array contains a blank entry"));
    }
    Ok(items)
}

/// A bare number within [0, 1]
pub fn parse_unit_score(text: &str) -> Result<f64> {
    const EXPECTED: &str = "number within [0, 1]";
    let value: f64 = unfence(text)
        .parse()
        .map_err(|_| SkillAlignerError::schema(EXPECTED, format!("'{}' is not a number", text.trim())))?;
    check_unit_interval(value, EXPECTED)
}

/// A single-line category label
pub fn parse_label(text: &str) -> Result<String> {
    const EXPECTED: &str = "single-line label";
    let label = unfence(text).trim_matches(|c: char| c == '"' || c.is_whitespace());
    if label.is_empty() {
        return Err(SkillAlignerError::schema(EXPECTED, "label is empty"));
    }
    if label.contains('\n') || label.chars().count() > 60 {
        return Err(SkillAlignerError::schema(EXPECTED, "label spans lines or exceeds 60 characters"));
    }
    Ok(label.to_string())
}

pub fn parse_gap_enrichment(text: &str) -> Result<GapEnrichment> {
    const EXPECTED: &str = "gap enrichment object";
    let enrichment: GapEnrichment = parse_json(text, EXPECTED)?;
    if enrichment.time_to_acquire.trim().is_empty() {
        return Err(SkillAlignerError::schema(EXPECTED, "timeToAcquire is empty"));
    }
    for resource in &enrichment.resources {
        if !resource.rating.is_finite() || resource.rating < 0.0 {
            return Err(SkillAlignerError::schema(EXPECTED, format!("invalid rating for '{}'", resource.title)));
        }
    }
    Ok(enrichment)
}

pub fn parse_market_outlook(text: &str) -> Result<MarketOutlook> {
    const EXPECTED: &str = "market outlook object";
    let outlook: MarketOutlook = parse_json(text, EXPECTED)?;
    check_unit_interval(outlook.score, EXPECTED)?;
    if let Some(confidence) = outlook.confidence {
        check_unit_interval(confidence, EXPECTED)?;
    }
    Ok(outlook)
}
