//! Typed reasoning calls: render a prompt, call the service under the retry
//! policy, and validate the response before it reaches any caller.

use crate::error::Result;
use crate::llm::prompts::{InsightParams, PromptTemplates, RecommendationParams};
use crate::llm::retry::RetryPolicy;
use crate::llm::schema::{self, GapEnrichment, MarketOutlook};
use crate::llm::service::{PromptRequest, ReasoningService};
use crate::processing::profile::{CandidateSkill, ProficiencyLevel};
use log::debug;
use std::sync::Arc;

pub struct ReasoningClient {
    service: Arc<dyn ReasoningService>,
    templates: PromptTemplates,
    retry: RetryPolicy,
}

impl ReasoningClient {
    pub fn new(service: Arc<dyn ReasoningService>, retry: RetryPolicy) -> Self {
        Self {
            service,
            templates: PromptTemplates::default(),
            retry,
        }
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    async fn call<T>(&self, request: PromptRequest, parse: fn(&str) -> Result<T>) -> Result<T> {
        let request = &request;
        let service = &self.service;

        self.retry
            .run(request.task.label(), |attempt| async move {
                debug!("{} via {} (attempt {})", request.task.label(), service.name(), attempt);
                let text = service.complete(request).await?;
                parse(&text)
            })
            .await
    }

    /// Rewrite skill names into the service's standard vocabulary
    pub async fn standardize_skills(&self, skills: &[String]) -> Result<Vec<String>> {
        self.call(self.templates.render_normalize(skills), schema::parse_string_list)
            .await
    }

    pub async fn enrich_gap(
        &self,
        skill: &str,
        current: Option<ProficiencyLevel>,
        required: ProficiencyLevel,
    ) -> Result<GapEnrichment> {
        self.call(
            self.templates.render_gap_enrichment(skill, current, required),
            schema::parse_gap_enrichment,
        )
        .await
    }

    /// How transferable the existing skills are to the missing ones, in [0, 1]
    pub async fn relatedness(&self, existing: &[CandidateSkill], missing: &[String]) -> Result<f64> {
        self.call(self.templates.render_relatedness(existing, missing), schema::parse_unit_score)
            .await
    }

    pub async fn categorize_cluster(&self, skills: &[String]) -> Result<String> {
        self.call(self.templates.render_cluster_label(skills), schema::parse_label)
            .await
    }

    pub async fn match_insights(&self, params: &InsightParams) -> Result<Vec<String>> {
        self.call(self.templates.render_match_insights(params), schema::parse_string_list)
            .await
    }

    pub async fn market_recommendations(&self, params: &RecommendationParams) -> Result<Vec<String>> {
        self.call(
            self.templates.render_market_recommendations(params),
            schema::parse_string_list,
        )
        .await
    }

    pub async fn market_outlook(&self, skill: &str) -> Result<MarketOutlook> {
        self.call(self.templates.render_market_outlook(skill), schema::parse_market_outlook)
            .await
    }
}
