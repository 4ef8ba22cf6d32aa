//! Deterministic in-process reasoning service.
//!
//! Answers every task from the structured `inputs` of the request using the
//! built-in taxonomy and string similarity, so the CLI works without a
//! network-backed model. Market outlooks are the one task it declines.

use crate::error::{Result, SkillAlignerError};
use crate::llm::schema::GapEnrichment;
use crate::llm::service::{PromptRequest, ReasoningService, ReasoningTask};
use crate::processing::gap_analyzer::{LearningResource, ResourceType};
use crate::processing::profile::canonical_name;
use crate::processing::taxonomy::{SkillTaxonomy, UNCATEGORIZED};
use async_trait::async_trait;
use std::collections::HashMap;
use strsim::jaro_winkler;

pub struct OfflineReasoner {
    taxonomy: SkillTaxonomy,
}

impl OfflineReasoner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            taxonomy: SkillTaxonomy::new()?,
        })
    }

    fn normalize(&self, inputs: &[String]) -> Result<String> {
        let mut out: Vec<String> = Vec::new();
        for name in inputs.iter().map(|s| self.taxonomy.canonicalize(s)) {
            if !name.is_empty() && !out.contains(&name) {
                out.push(name);
            }
        }
        Ok(serde_json::to_string(&out)?)
    }

    fn gap_enrichment(&self, inputs: &[String]) -> Result<String> {
        let [skill, current, required] = inputs else {
            return Err(SkillAlignerError::InvalidInput("gap enrichment expects skill, current and required level".to_string()));
        };
        let steps = level_ordinal(required).saturating_sub(level_ordinal(current)).max(1);
        let weeks = steps * 2;

        let enrichment = GapEnrichment {
            time_to_acquire: format!("{} weeks", weeks),
            prerequisites: self.taxonomy.prerequisites_of(skill).to_vec(),
            resources: vec![LearningResource {
                title: format!("{} documentation", skill),
                resource_type: ResourceType::Documentation,
                provider: "Official documentation".to_string(),
                url: format!("https://duckduckgo.com/?q={}+documentation", skill.replace(' ', "+")),
                duration: format!("{} hours", steps * 10),
                cost: "Free".to_string(),
                rating: 4.0,
            }],
        };
        Ok(serde_json::to_string(&enrichment)?)
    }

    /// Mean over missing skills of the best link to an existing skill:
    /// 1.0 for a direct prerequisite, 0.8 for a shared category, otherwise
    /// the closest spelling by Jaro-Winkler.
    fn relatedness(&self, inputs: &[String]) -> Result<String> {
        let existing: Vec<String> = inputs
            .iter()
            .filter_map(|s| s.strip_prefix("existing:"))
            .map(|s| self.taxonomy.canonicalize(s))
            .collect();
        let missing: Vec<String> = inputs
            .iter()
            .filter_map(|s| s.strip_prefix("missing:"))
            .map(|s| self.taxonomy.canonicalize(s))
            .collect();

        if missing.is_empty() {
            return Ok("1.0".to_string());
        }

        let total: f64 = missing
            .iter()
            .map(|target| {
                let prereqs = self.taxonomy.prerequisites_of(target);
                let category = self.taxonomy.category_of(target);
                existing
                    .iter()
                    .map(|have| {
                        if prereqs.contains(have) {
                            1.0
                        } else if category.is_some() && self.taxonomy.category_of(have) == category {
                            0.8
                        } else {
                            jaro_winkler(have, target) * 0.5
                        }
                    })
                    .fold(0.0, f64::max)
            })
            .sum();

        Ok(format!("{:.2}", (total / missing.len() as f64).clamp(0.0, 1.0)))
    }

    fn cluster_label(&self, inputs: &[String]) -> String {
        self.taxonomy.label_for(inputs).unwrap_or(UNCATEGORIZED).to_string()
    }

    fn match_insights(&self, inputs: &[String]) -> Result<String> {
        let values: HashMap<&str, f64> = inputs
            .iter()
            .filter_map(|s| s.split_once('='))
            .filter_map(|(k, v)| v.parse::<f64>().ok().map(|v| (k, v)))
            .collect();
        let gaps: Vec<&str> = inputs
            .iter()
            .filter_map(|s| s.strip_prefix("gap="))
            .filter_map(|s| s.split('|').next())
            .collect();
        let get = |key: &str| values.get(key).copied().unwrap_or(0.0);

        let mut insights = Vec::new();
        let skill_match = get("skill_match");
        insights.push(match skill_match {
            s if s >= 0.8 => format!("Strong skill coverage: {:.0}% of the weighted requirements are met.", s * 100.0),
            s if s >= 0.5 => format!("Partial skill coverage: {:.0}% of the weighted requirements are met.", s * 100.0),
            s => format!("Limited skill coverage: only {:.0}% of the weighted requirements are met.", s * 100.0),
        });

        let components = [
            ("proficiency", get("proficiency_match")),
            ("market alignment", get("market_alignment")),
            ("learning potential", get("learning_potential")),
            ("experience", get("experience_match")),
        ];
        if let Some((name, value)) = components.iter().copied().max_by(|a, b| a.1.total_cmp(&b.1)) {
            insights.push(format!("Key strength: {} ({:.0}%).", name, value * 100.0));
        }

        if gaps.is_empty() {
            insights.push("No skill gaps against this role's requirements.".to_string());
        } else {
            insights.push(format!("Focus areas for improvement: {}.", gaps.join(", ")));
        }

        let learning = get("learning_potential");
        insights.push(if learning >= 0.6 {
            "Good development potential: the missing skills build on existing strengths.".to_string()
        } else {
            "Closing the gaps will need dedicated study beyond current strengths.".to_string()
        });

        Ok(serde_json::to_string(&insights)?)
    }

    fn market_recommendations(&self, inputs: &[String]) -> Result<String> {
        let rising = csv_field(inputs, "rising=");
        let declining = csv_field(inputs, "declining=");
        let emerging = csv_field(inputs, "emerging=");
        let largest_cluster = inputs
            .iter()
            .filter_map(|s| s.strip_prefix("cluster="))
            .filter_map(|s| s.split_once('|'))
            .max_by_key(|(_, skills)| skills.split(',').count())
            .map(|(category, _)| category);

        let mut recommendations = Vec::new();
        if !rising.is_empty() {
            recommendations.push(format!("Prioritize hiring and upskilling in rising skills: {}.", top(&rising)));
        }
        if !emerging.is_empty() {
            recommendations.push(format!("Run pilot projects to build early expertise in {}.", top(&emerging)));
        }
        if let Some(category) = largest_cluster {
            recommendations.push(format!("Build cross-functional depth around the {} skill cluster.", category));
        }
        if !declining.is_empty() {
            recommendations.push(format!("Plan migration paths away from declining skills: {}.", top(&declining)));
        }
        if recommendations.is_empty() {
            recommendations.push("Keep monitoring market signals; no strong movements were detected.".to_string());
        }
        Ok(serde_json::to_string(&recommendations)?)
    }
}

fn csv_field<'a>(inputs: &'a [String], key: &str) -> Vec<&'a str> {
    inputs
        .iter()
        .find_map(|s| s.strip_prefix(key))
        .map(|s| s.split(',').filter(|x| !x.is_empty()).collect())
        .unwrap_or_default()
}

fn top(items: &[&str]) -> String {
    items.iter().take(3).copied().collect::<Vec<_>>().join(", ")
}

fn level_ordinal(level: &str) -> u8 {
    match level {
        "BEGINNER" => 1,
        "INTERMEDIATE" => 2,
        "EXPERT" => 3,
        _ => 0,
    }
}

#[async_trait]
impl ReasoningService for OfflineReasoner {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, request: &PromptRequest) -> Result<String> {
        let inputs: Vec<String> = match request.task {
            ReasoningTask::NormalizeSkills | ReasoningTask::ClusterLabel => {
                request.inputs.iter().map(|s| canonical_name(s)).collect()
            }
            _ => request.inputs.clone(),
        };

        match request.task {
            ReasoningTask::NormalizeSkills => self.normalize(&inputs),
            ReasoningTask::GapEnrichment => self.gap_enrichment(&inputs),
            ReasoningTask::Relatedness => self.relatedness(&inputs),
            ReasoningTask::ClusterLabel => Ok(self.cluster_label(&inputs)),
            ReasoningTask::MatchInsights => self.match_insights(&inputs),
            ReasoningTask::MarketRecommendations => self.market_recommendations(&inputs),
            // Not retryable: there is nothing to wait for
            ReasoningTask::MarketOutlook => Err(SkillAlignerError::Configuration(
                "the offline reasoner has no market data".to_string(),
            )),
        }
    }
}
