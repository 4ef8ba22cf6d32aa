//! Skill gap detection and learning-path ordering

use crate::llm::analyzer::ReasoningClient;
use crate::llm::schema::GapEnrichment;
use crate::market::SignalCache;
use crate::processing::duration::{format_cost, format_hours, parse_cost, parse_hours};
use crate::processing::profile::{canonical_name, CandidateSkill, ProficiencyLevel, SkillRequirement};
use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Relevance used when no cached market signal exists for a gap
const DEFAULT_RELEVANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Course,
    Book,
    Tutorial,
    Documentation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearningResource {
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub provider: String,
    pub url: String,
    pub duration: String,
    pub cost: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    /// `None` when the candidate lacks the skill entirely
    pub current_level: Option<ProficiencyLevel>,
    pub required_level: ProficiencyLevel,
    pub importance: f64,
    pub required: bool,
    pub relevance: f64,
    pub time_to_acquire: String,
    pub prerequisites: Vec<String>,
    pub resources: Vec<LearningResource>,
}

impl SkillGap {
    pub fn is_missing(&self) -> bool {
        self.current_level.is_none()
    }

    /// Proficiency steps between the current and required level
    pub fn levels_short(&self) -> u8 {
        level_distance(self.current_level, self.required_level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Bucket the mean gap importance: < 0.4 beginner, < 0.7 intermediate
    pub fn from_gaps(gaps: &[SkillGap]) -> Self {
        if gaps.is_empty() {
            return Difficulty::Beginner;
        }
        let mean = gaps.iter().map(|g| g.importance).sum::<f64>() / gaps.len() as f64;
        if mean < 0.4 {
            Difficulty::Beginner
        } else if mean < 0.7 {
            Difficulty::Intermediate
        } else {
            Difficulty::Advanced
        }
    }

    /// 1 for beginner, 2 for intermediate, 3 for advanced
    pub fn level(self) -> u8 {
        match self {
            Difficulty::Beginner => 1,
            Difficulty::Intermediate => 2,
            Difficulty::Advanced => 3,
        }
    }

    /// Inverse of the difficulty level: 1, 1/2, 1/3
    pub fn ease(self) -> f64 {
        1.0 / self.level() as f64
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

/// Ordered remediation plan. `gaps` is in learning order: every prerequisite
/// that is itself a gap comes before the gaps that depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub gaps: Vec<SkillGap>,
    pub total_time: String,
    pub total_cost: String,
    pub difficulty: Difficulty,
}

impl LearningPath {
    pub fn empty() -> Self {
        Self::from_ordered(Vec::new())
    }

    fn from_ordered(gaps: Vec<SkillGap>) -> Self {
        let total_hours: f64 = gaps.iter().map(|g| parse_hours(&g.time_to_acquire)).sum();
        let total_cost: f64 = gaps
            .iter()
            .flat_map(|g| g.resources.iter())
            .map(|r| parse_cost(&r.cost))
            .sum();
        let difficulty = Difficulty::from_gaps(&gaps);

        Self {
            total_time: format_hours(total_hours),
            total_cost: format_cost(total_cost),
            difficulty,
            gaps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn skill_names(&self) -> Vec<&str> {
        self.gaps.iter().map(|g| g.skill.as_str()).collect()
    }

    pub fn get(&self, skill: &str) -> Option<&SkillGap> {
        let key = canonical_name(skill);
        self.gaps.iter().find(|g| g.skill == key)
    }
}

/// A requirement the candidate does not meet, before enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGap {
    pub skill: String,
    pub current_level: Option<ProficiencyLevel>,
    pub required_level: ProficiencyLevel,
    pub importance: f64,
    pub required: bool,
}

fn level_distance(current: Option<ProficiencyLevel>, required: ProficiencyLevel) -> u8 {
    let current = current.map(ProficiencyLevel::ordinal).unwrap_or(0);
    required.ordinal().saturating_sub(current)
}

/// Requirements the candidate lacks or holds below the required level.
/// Repeated requirements for one skill keep the first occurrence.
pub fn find_gaps(candidate_skills: &[CandidateSkill], requirements: &[SkillRequirement]) -> Vec<PendingGap> {
    let held: HashMap<String, ProficiencyLevel> = candidate_skills
        .iter()
        .map(|s| (canonical_name(&s.name), s.proficiency_level))
        .collect();

    let mut seen = HashSet::new();
    requirements
        .iter()
        .filter_map(|req| {
            let skill = canonical_name(&req.name);
            if !seen.insert(skill.clone()) {
                return None;
            }
            let current_level = held.get(&skill).copied();
            let short = match current_level {
                None => true,
                Some(level) => level < req.proficiency_level,
            };
            short.then(|| PendingGap {
                skill,
                current_level,
                required_level: req.proficiency_level,
                importance: req.importance,
                required: req.required,
            })
        })
        .collect()
}

/// Enrichment used when the reasoning service cannot provide one:
/// one week per missing proficiency level, no prerequisites, no resources.
pub fn fallback_enrichment(current: Option<ProficiencyLevel>, required: ProficiencyLevel) -> GapEnrichment {
    let weeks = level_distance(current, required).max(1);
    GapEnrichment {
        time_to_acquire: format!("{} {}", weeks, if weeks == 1 { "week" } else { "weeks" }),
        prerequisites: Vec::new(),
        resources: Vec::new(),
    }
}

/// Learning order over `gaps`, which must already be sorted by importance
/// descending. Returns indices into `gaps`.
///
/// Edges run prerequisite -> dependent; a depth-first walk appends nodes in
/// post-order and the reversed sequence puts every prerequisite first.
/// Prerequisites that are not gaps are ignored, and a revisit ends the walk
/// so cycles cannot recurse forever.
pub fn learning_order(gaps: &[SkillGap]) -> Vec<usize> {
    let index: HashMap<&str, usize> = gaps.iter().enumerate().map(|(i, g)| (g.skill.as_str(), i)).collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); gaps.len()];
    for (i, gap) in gaps.iter().enumerate() {
        for prereq in &gap.prerequisites {
            match index.get(prereq.as_str()) {
                Some(&j) if j != i => dependents[j].push(i),
                Some(_) => {}
                None => debug!("Prerequisite '{}' of '{}' is not a gap; skipping", prereq, gap.skill),
            }
        }
    }

    let mut visited = vec![false; gaps.len()];
    let mut post_order = Vec::with_capacity(gaps.len());

    // Reverse iteration so that, after the final reversal, independent gaps
    // come out highest importance first
    for root in (0..gaps.len()).rev() {
        visit(root, &dependents, &mut visited, &mut post_order);
    }

    post_order.reverse();
    post_order
}

fn visit(node: usize, dependents: &[Vec<usize>], visited: &mut [bool], post_order: &mut Vec<usize>) {
    if visited[node] {
        return;
    }
    visited[node] = true;
    for &next in dependents[node].iter().rev() {
        visit(next, dependents, visited, post_order);
    }
    post_order.push(node);
}

/// Diffs a candidate against job requirements and builds the learning path
pub struct SkillGapAnalyzer {
    reasoning: Arc<ReasoningClient>,
    signals: Option<Arc<SignalCache>>,
}

impl SkillGapAnalyzer {
    pub fn new(reasoning: Arc<ReasoningClient>) -> Self {
        Self {
            reasoning,
            signals: None,
        }
    }

    /// Read gap relevance from cached market signals
    pub fn with_signal_cache(mut self, signals: Arc<SignalCache>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub async fn analyze(&self, candidate_skills: &[CandidateSkill], requirements: &[SkillRequirement]) -> LearningPath {
        let pending = find_gaps(candidate_skills, requirements);
        if pending.is_empty() {
            return LearningPath::empty();
        }
        debug!("Enriching {} skill gap(s)", pending.len());

        // Gaps are independent, so enrichment runs concurrently
        let mut gaps: Vec<SkillGap> = join_all(pending.into_iter().map(|p| self.enrich(p))).await;

        gaps.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        let order = learning_order(&gaps);
        let mut slots: Vec<Option<SkillGap>> = gaps.into_iter().map(Some).collect();
        let ordered = order.into_iter().filter_map(|i| slots[i].take()).collect();

        LearningPath::from_ordered(ordered)
    }

    async fn enrich(&self, pending: PendingGap) -> SkillGap {
        let enrichment = match self
            .reasoning
            .enrich_gap(&pending.skill, pending.current_level, pending.required_level)
            .await
        {
            Ok(enrichment) => enrichment,
            Err(e) => {
                warn!("Gap enrichment for '{}' failed, using estimate: {}", pending.skill, e);
                fallback_enrichment(pending.current_level, pending.required_level)
            }
        };

        let mut prerequisites: Vec<String> = Vec::new();
        for prereq in enrichment.prerequisites.iter().map(|p| canonical_name(p)) {
            if !prereq.is_empty() && prereq != pending.skill && !prerequisites.contains(&prereq) {
                prerequisites.push(prereq);
            }
        }

        let relevance = match &self.signals {
            Some(cache) => cache
                .peek(&pending.skill)
                .await
                .map(|signal| signal.score)
                .unwrap_or(DEFAULT_RELEVANCE),
            None => DEFAULT_RELEVANCE,
        };

        SkillGap {
            skill: pending.skill,
            current_level: pending.current_level,
            required_level: pending.required_level,
            importance: pending.importance,
            required: pending.required,
            relevance,
            time_to_acquire: enrichment.time_to_acquire,
            prerequisites,
            resources: enrichment.resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::service::ReasoningTask;
    use crate::test_support::{candidate_skill, client, requirement, ScriptedReasoner};

    fn gap(skill: &str, importance: f64, prerequisites: &[&str]) -> SkillGap {
        SkillGap {
            skill: skill.to_string(),
            current_level: None,
            required_level: ProficiencyLevel::Intermediate,
            importance,
            required: true,
            relevance: DEFAULT_RELEVANCE,
            time_to_acquire: "1 week".to_string(),
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            resources: Vec::new(),
        }
    }

    fn names(gaps: &[SkillGap], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| gaps[i].skill.clone()).collect()
    }

    #[test]
    fn test_find_gaps_missing_and_underleveled() {
        let candidate = vec![
            candidate_skill("JavaScript", ProficiencyLevel::Expert, 5.0),
            candidate_skill("React", ProficiencyLevel::Beginner, 1.0),
        ];
        let requirements = vec![
            requirement("javascript", ProficiencyLevel::Expert, 1.0, true),
            requirement("react", ProficiencyLevel::Intermediate, 0.8, true),
            requirement("TypeScript", ProficiencyLevel::Intermediate, 0.6, false),
        ];

        let gaps = find_gaps(&candidate, &requirements);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].skill, "react");
        assert_eq!(gaps[0].current_level, Some(ProficiencyLevel::Beginner));
        assert_eq!(gaps[1].skill, "typescript");
        assert_eq!(gaps[1].current_level, None);
    }

    #[test]
    fn test_prerequisite_comes_first() {
        // B outranks A but depends on it
        let gaps = vec![gap("b", 0.9, &["a"]), gap("a", 0.2, &[])];
        let order = learning_order(&gaps);
        assert_eq!(names(&gaps, &order), vec!["a", "b"]);
    }

    #[test]
    fn test_independent_gaps_keep_importance_order() {
        let gaps = vec![gap("x", 0.9, &[]), gap("y", 0.5, &[]), gap("z", 0.1, &[])];
        let order = learning_order(&gaps);
        assert_eq!(names(&gaps, &order), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_chain_and_foreign_prerequisites() {
        let gaps = vec![
            gap("kubernetes", 0.9, &["docker"]),
            gap("docker", 0.7, &["linux"]),
            gap("terraform", 0.5, &["cloud"]),
        ];
        let order = learning_order(&gaps);
        let ordered = names(&gaps, &order);
        assert_eq!(ordered.len(), 3);
        let pos = |s: &str| ordered.iter().position(|n| n == s).unwrap();
        assert!(pos("docker") < pos("kubernetes"));
        assert!(!ordered.contains(&"linux".to_string()));
    }

    #[test]
    fn test_cycle_terminates() {
        let gaps = vec![gap("a", 0.5, &["b"]), gap("b", 0.5, &["a"])];
        let order = learning_order(&gaps);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_difficulty_buckets() {
        assert_eq!(Difficulty::from_gaps(&[]), Difficulty::Beginner);
        assert_eq!(Difficulty::from_gaps(&[gap("a", 0.3, &[])]), Difficulty::Beginner);
        assert_eq!(Difficulty::from_gaps(&[gap("a", 0.5, &[]), gap("b", 0.6, &[])]), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_gaps(&[gap("a", 0.9, &[])]), Difficulty::Advanced);
        assert_eq!(Difficulty::Intermediate.ease(), 0.5);
        assert!((Difficulty::Advanced.ease() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_path_totals() {
        let path = LearningPath::empty();
        assert_eq!(path.total_time, "0 hours");
        assert_eq!(path.total_cost, "Free");
        assert_eq!(path.difficulty, Difficulty::Beginner);
    }

    #[test]
    fn test_fallback_enrichment_scales_with_levels() {
        assert_eq!(fallback_enrichment(None, ProficiencyLevel::Expert).time_to_acquire, "3 weeks");
        assert_eq!(
            fallback_enrichment(Some(ProficiencyLevel::Intermediate), ProficiencyLevel::Expert).time_to_acquire,
            "1 week"
        );
    }

    #[tokio::test]
    async fn test_analyze_orders_and_totals() {
        let reasoner = ScriptedReasoner::new()
            .respond_for(
                ReasoningTask::GapEnrichment,
                "react",
                r#"{"timeToAcquire": "3 weeks", "prerequisites": ["JavaScript"], "resources": [
                    {"title": "React Course", "type": "course", "provider": "Academy",
                     "url": "https://example.org/react", "duration": "20 hours", "cost": "$49.99", "rating": 4.5}
                ]}"#,
            )
            .respond_for(
                ReasoningTask::GapEnrichment,
                "javascript",
                r#"{"timeToAcquire": "2 weeks", "prerequisites": [], "resources": [
                    {"title": "JS Guide", "type": "documentation", "provider": "MDN",
                     "url": "https://developer.mozilla.org", "duration": "10 hours", "cost": "Free", "rating": 4.9}
                ]}"#,
            );
        let analyzer = SkillGapAnalyzer::new(client(reasoner));

        let requirements = vec![
            requirement("React", ProficiencyLevel::Intermediate, 0.8, true),
            requirement("JavaScript", ProficiencyLevel::Intermediate, 0.4, true),
        ];
        let path = analyzer.analyze(&[], &requirements).await;

        assert_eq!(path.skill_names(), vec!["javascript", "react"]);
        assert_eq!(path.total_time, "2 weeks");
        assert_eq!(path.total_cost, "$49.99");
        assert_eq!(path.difficulty, Difficulty::Intermediate);
        assert_eq!(path.get("React").unwrap().prerequisites, vec!["javascript"]);
    }

    #[tokio::test]
    async fn test_analyze_falls_back_when_enrichment_fails() {
        let analyzer = SkillGapAnalyzer::new(client(ScriptedReasoner::new()));
        let requirements = vec![requirement("Go", ProficiencyLevel::Expert, 0.5, true)];

        let path = analyzer.analyze(&[], &requirements).await;
        let gap = path.get("go").unwrap();
        assert_eq!(gap.time_to_acquire, "3 weeks");
        assert!(gap.resources.is_empty());
        assert_eq!(gap.relevance, DEFAULT_RELEVANCE);
        assert_eq!(path.total_cost, "Free");
    }
}
