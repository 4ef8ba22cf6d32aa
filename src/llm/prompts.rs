//! Prompt templates for the reasoning service

use crate::llm::service::{PromptRequest, ReasoningTask};
use crate::processing::profile::{CandidateSkill, ProficiencyLevel};

/// Values fed to the match-insight narrative
#[derive(Debug, Clone)]
pub struct InsightParams {
    pub job_title: String,
    pub skill_match: f64,
    pub proficiency_match: f64,
    pub market_alignment: f64,
    pub learning_potential: f64,
    pub experience_match: f64,
    /// (skill, time to acquire)
    pub gaps: Vec<(String, String)>,
}

/// Values fed to the strategic market recommendations
#[derive(Debug, Clone)]
pub struct RecommendationParams {
    pub rising: Vec<String>,
    pub stable: Vec<String>,
    pub declining: Vec<String>,
    pub emerging: Vec<String>,
    /// (category, member skills)
    pub clusters: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub normalize: String,
    pub gap_enrichment: String,
    pub relatedness: String,
    pub cluster_label: String,
    pub match_insights: String,
    pub market_recommendations: String,
    pub market_outlook: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            normalize: NORMALIZE_TEMPLATE.to_string(),
            gap_enrichment: GAP_ENRICHMENT_TEMPLATE.to_string(),
            relatedness: RELATEDNESS_TEMPLATE.to_string(),
            cluster_label: CLUSTER_LABEL_TEMPLATE.to_string(),
            match_insights: MATCH_INSIGHTS_TEMPLATE.to_string(),
            market_recommendations: MARKET_RECOMMENDATIONS_TEMPLATE.to_string(),
            market_outlook: MARKET_OUTLOOK_TEMPLATE.to_string(),
        }
    }
}

fn bullet_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

impl PromptTemplates {
    pub fn render_normalize(&self, skills: &[String]) -> PromptRequest {
        PromptRequest {
            task: ReasoningTask::NormalizeSkills,
            system: "You are a skill normalization expert. Standardize these skill names while preserving their meaning. Return the result as a JSON array of strings.".to_string(),
            prompt: self.normalize.replace("{skills}", &skills.join(", ")),
            inputs: skills.to_vec(),
            temperature: 0.3,
            max_tokens: 1000,
        }
    }

    pub fn render_gap_enrichment(
        &self,
        skill: &str,
        current: Option<ProficiencyLevel>,
        required: ProficiencyLevel,
    ) -> PromptRequest {
        let current = current.map(|level| level.to_string()).unwrap_or_else(|| "NONE".to_string());
        PromptRequest {
            task: ReasoningTask::GapEnrichment,
            system: "You are a skilled career advisor and learning path expert.".to_string(),
            prompt: self
                .gap_enrichment
                .replace("{skill}", skill)
                .replace("{current}", &current)
                .replace("{required}", &required.to_string()),
            inputs: vec![skill.to_string(), current, required.to_string()],
            temperature: 0.3,
            max_tokens: 1000,
        }
    }

    pub fn render_relatedness(&self, existing: &[CandidateSkill], missing: &[String]) -> PromptRequest {
        let existing_lines = bullet_list(existing.iter().map(|s| format!("{} ({})", s.name, s.proficiency_level)));
        let mut inputs: Vec<String> = existing.iter().map(|s| format!("existing:{}", s.name)).collect();
        inputs.extend(missing.iter().map(|s| format!("missing:{}", s)));

        PromptRequest {
            task: ReasoningTask::Relatedness,
            system: "You are an expert in skill analysis and learning pathways.".to_string(),
            prompt: self
                .relatedness
                .replace("{existing}", &existing_lines)
                .replace("{missing}", &bullet_list(missing)),
            inputs,
            temperature: 0.3,
            max_tokens: 10,
        }
    }

    pub fn render_cluster_label(&self, skills: &[String]) -> PromptRequest {
        PromptRequest {
            task: ReasoningTask::ClusterLabel,
            system: "You are a skill categorization expert. Provide concise, accurate categories.".to_string(),
            prompt: self.cluster_label.replace("{skills}", &skills.join(", ")),
            inputs: skills.to_vec(),
            temperature: 0.3,
            max_tokens: 50,
        }
    }

    pub fn render_match_insights(&self, params: &InsightParams) -> PromptRequest {
        let gaps = if params.gaps.is_empty() {
            "- none".to_string()
        } else {
            bullet_list(params.gaps.iter().map(|(name, time)| format!("{} ({} to learn)", name, time)))
        };

        let components = [
            ("skill_match", params.skill_match),
            ("proficiency_match", params.proficiency_match),
            ("market_alignment", params.market_alignment),
            ("learning_potential", params.learning_potential),
            ("experience_match", params.experience_match),
        ];
        let mut inputs: Vec<String> = components.iter().map(|(k, v)| format!("{}={:.4}", k, v)).collect();
        inputs.extend(params.gaps.iter().map(|(name, time)| format!("gap={}|{}", name, time)));

        PromptRequest {
            task: ReasoningTask::MatchInsights,
            system: "You are an expert career advisor and job matching specialist.".to_string(),
            prompt: self
                .match_insights
                .replace("{title}", &params.job_title)
                .replace("{skill_match}", &percent(params.skill_match))
                .replace("{proficiency_match}", &percent(params.proficiency_match))
                .replace("{market_alignment}", &percent(params.market_alignment))
                .replace("{learning_potential}", &percent(params.learning_potential))
                .replace("{experience_match}", &percent(params.experience_match))
                .replace("{gaps}", &gaps),
            inputs,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    pub fn render_market_recommendations(&self, params: &RecommendationParams) -> PromptRequest {
        let clusters = bullet_list(
            params
                .clusters
                .iter()
                .map(|(category, skills)| format!("{}: {}", category, skills.join(", "))),
        );

        let mut inputs = vec![
            format!("rising={}", params.rising.join(",")),
            format!("stable={}", params.stable.join(",")),
            format!("declining={}", params.declining.join(",")),
            format!("emerging={}", params.emerging.join(",")),
        ];
        inputs.extend(params.clusters.iter().map(|(category, skills)| format!("cluster={}|{}", category, skills.join(","))));

        PromptRequest {
            task: ReasoningTask::MarketRecommendations,
            system: "You are a strategic workforce planning expert with deep knowledge of technology trends.".to_string(),
            prompt: self
                .market_recommendations
                .replace("{rising}", &params.rising.join(", "))
                .replace("{stable}", &params.stable.join(", "))
                .replace("{declining}", &params.declining.join(", "))
                .replace("{emerging}", &params.emerging.join(", "))
                .replace("{clusters}", &clusters),
            inputs,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    pub fn render_market_outlook(&self, skill: &str) -> PromptRequest {
        PromptRequest {
            task: ReasoningTask::MarketOutlook,
            system: "You are a market research expert analyzing technology skill trends.".to_string(),
            prompt: self.market_outlook.replace("{skill}", skill),
            inputs: vec![skill.to_string()],
            temperature: 0.3,
            max_tokens: 200,
        }
    }
}

const NORMALIZE_TEMPLATE: &str = "Normalize these skills: {skills}";

const GAP_ENRICHMENT_TEMPLATE: &str = r#"Analyze the learning requirements for {skill} skill:
Current level: {current}
Required level: {required}

Please provide:
1. Estimated time to acquire
2. Prerequisites
3. Best learning resources (courses, books, tutorials)

Format as JSON with exactly these fields:
{
  "timeToAcquire": "string",
  "prerequisites": ["string"],
  "resources": [{
    "title": "string",
    "type": "course|book|tutorial|documentation",
    "provider": "string",
    "url": "string",
    "duration": "string",
    "cost": "string",
    "rating": number
  }]
}"#;

const RELATEDNESS_TEMPLATE: &str = r#"Analyze how the candidate's existing skills relate to the missing skills they need to learn.

Existing Skills:
{existing}

Missing Skills:
{missing}

Rate the relationship between existing and missing skills on a scale of 0-1, where:
0 = No relationship (completely different domains)
1 = Strong relationship (highly transferable skills)

Return only the numerical score."#;

const CLUSTER_LABEL_TEMPLATE: &str = r#"Analyze these related skills and provide a single category name that best describes them:

Skills: {skills}

Consider categories like:
- Frontend Development
- Backend Development
- Data Science
- DevOps
- Cloud Computing
- Machine Learning
- Mobile Development

Return only the category name, nothing else."#;

const MATCH_INSIGHTS_TEMPLATE: &str = r#"Analyze this job match and provide key insights:
Job Title: {title}

Match Scores:
- Skill Match: {skill_match}
- Proficiency Match: {proficiency_match}
- Market Alignment: {market_alignment}
- Learning Potential: {learning_potential}
- Experience Match: {experience_match}

Skill Gaps:
{gaps}

Provide 3-5 key insights about this match, focusing on:
1. Overall match quality
2. Key strengths
3. Areas for improvement
4. Development potential

Format as a JSON array of strings."#;

const MARKET_RECOMMENDATIONS_TEMPLATE: &str = r#"Based on the following market data, provide strategic recommendations:

Rising Skills: {rising}
Stable Skills: {stable}
Declining Skills: {declining}

Emerging Skills: {emerging}

Skill Clusters:
{clusters}

Provide 3-5 strategic recommendations for skill development and hiring.
Focus on:
1. High-demand skill combinations
2. Future-proof skill paths
3. Strategic upskilling opportunities
4. Emerging technology adoption

Format as JSON array of strings."#;

const MARKET_OUTLOOK_TEMPLATE: &str = r#"Analyze the current market demand and future outlook for {skill} skill.
Consider:
1. Industry adoption
2. Job market demand
3. Future growth potential
4. Technology maturity

Return JSON format:
{
  "score": number (0-1),
  "trend": "RISING" | "STABLE" | "DECLINING",
  "confidence": number (0-1)
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rendering() {
        let templates = PromptTemplates::default();
        let request = templates.render_normalize(&["js".to_string(), "reactjs".to_string()]);
        assert_eq!(request.task, ReasoningTask::NormalizeSkills);
        assert!(request.prompt.contains("js, reactjs"));
        assert_eq!(request.inputs.len(), 2);
    }

    #[test]
    fn test_gap_rendering_marks_missing_level() {
        let templates = PromptTemplates::default();
        let request = templates.render_gap_enrichment("react", None, ProficiencyLevel::Expert);
        assert!(request.prompt.contains("Current level: NONE"));
        assert!(request.prompt.contains("Required level: EXPERT"));
        assert_eq!(request.inputs, vec!["react", "NONE", "EXPERT"]);
    }

    #[test]
    fn test_insight_rendering() {
        let templates = PromptTemplates::default();
        let params = InsightParams {
            job_title: "Senior Developer".into(),
            skill_match: 1.0,
            proficiency_match: 0.5,
            market_alignment: 0.25,
            learning_potential: 0.8,
            experience_match: 1.0,
            gaps: vec![("typescript".into(), "2 weeks".into())],
        };
        let request = templates.render_match_insights(&params);
        assert!(request.prompt.contains("Job Title: Senior Developer"));
        assert!(request.prompt.contains("Proficiency Match: 50.0%"));
        assert!(request.prompt.contains("- typescript (2 weeks to learn)"));
        assert!(!request.prompt.contains('{') || request.prompt.contains("JSON"));
    }
}
