//! Canonicalization of raw skill-name lists

use crate::llm::analyzer::ReasoningClient;
use crate::processing::profile::canonical_name;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

pub struct SkillNormalizer {
    reasoning: Arc<ReasoningClient>,
}

impl SkillNormalizer {
    pub fn new(reasoning: Arc<ReasoningClient>) -> Self {
        Self { reasoning }
    }

    /// Trim, lowercase and dedupe, keeping first-seen order. Blank names are dropped.
    pub fn basic(raw: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        raw.iter()
            .map(|name| canonical_name(name))
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect()
    }

    /// Canonical skill names for `raw`.
    ///
    /// Never fails: when the reasoning service cannot standardize the list,
    /// the basic deduped form is returned instead.
    pub async fn normalize(&self, raw: &[String]) -> Vec<String> {
        let basic = Self::basic(raw);
        if basic.is_empty() {
            return basic;
        }

        match self.reasoning.standardize_skills(&basic).await {
            Ok(standardized) => {
                let normalized = Self::basic(&standardized);
                debug!("Normalized {} raw skill(s) into {}", raw.len(), normalized.len());
                normalized
            }
            Err(e) => {
                warn!("Skill normalization via {} failed, keeping basic form: {}", self.reasoning.service_name(), e);
                basic
            }
        }
    }
}
