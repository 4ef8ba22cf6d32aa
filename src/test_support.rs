//! Deterministic stub ports shared by unit tests

use crate::error::{Result, SkillAlignerError};
use crate::llm::analyzer::ReasoningClient;
use crate::llm::retry::RetryPolicy;
use crate::llm::service::{PromptRequest, ReasoningService, ReasoningTask};
use crate::market::sources::{MarketSource, SourceResult};
use crate::market::Trend;
use crate::processing::profile::{CandidateSkill, ProficiencyLevel, SkillRequirement};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reasoning stub answering from a script keyed by task and, optionally,
/// the request's first input. Unscripted requests fail as an external error.
#[derive(Default)]
pub struct ScriptedReasoner {
    by_task: HashMap<ReasoningTask, String>,
    by_input: HashMap<(ReasoningTask, String), String>,
    calls: AtomicUsize,
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, task: ReasoningTask, text: &str) -> Self {
        self.by_task.insert(task, text.to_string());
        self
    }

    pub fn respond_for(mut self, task: ReasoningTask, first_input: &str, text: &str) -> Self {
        self.by_input.insert((task, first_input.to_string()), text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &PromptRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let keyed = request
            .inputs
            .first()
            .and_then(|first| self.by_input.get(&(request.task, first.clone())));

        keyed
            .or_else(|| self.by_task.get(&request.task))
            .cloned()
            .ok_or_else(|| SkillAlignerError::external("scripted", format!("no response for {}", request.task.label())))
    }
}

pub fn client(service: impl ReasoningService + 'static) -> Arc<ReasoningClient> {
    Arc::new(ReasoningClient::new(Arc::new(service), RetryPolicy::immediate(3)))
}

/// Market source stub with a fixed per-skill table and a call counter
pub struct StaticSource {
    id: String,
    weight: f64,
    table: HashMap<String, SourceResult>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(id: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            weight,
            table: HashMap::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, skill: &str, score: f64, trend: Trend, job_count: u64) -> Self {
        self.table.insert(
            skill.to_string(),
            SourceResult {
                score,
                trend,
                job_count: Some(job_count),
                avg_salary: None,
            },
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSource for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn nominal_weight(&self) -> f64 {
        self.weight
    }

    async fn fetch_signal(&self, skill: &str) -> Result<Option<SourceResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SkillAlignerError::external(self.id.clone(), "unavailable"));
        }
        Ok(self.table.get(skill).cloned())
    }
}

pub fn requirement(name: &str, level: ProficiencyLevel, importance: f64, required: bool) -> SkillRequirement {
    SkillRequirement {
        name: name.to_string(),
        proficiency_level: level,
        importance,
        required,
    }
}

pub fn candidate_skill(name: &str, level: ProficiencyLevel, years: f64) -> CandidateSkill {
    CandidateSkill {
        name: name.to_string(),
        proficiency_level: level,
        years_of_experience: years,
    }
}
