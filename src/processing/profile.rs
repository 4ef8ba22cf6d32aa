//! Skill, job and candidate records shared by every analysis component

use crate::error::{Result, SkillAlignerError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Canonical join key for a skill name: trimmed and lowercased
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ordinal proficiency: BEGINNER < INTERMEDIATE < EXPERT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl ProficiencyLevel {
    pub fn ordinal(self) -> u8 {
        match self {
            ProficiencyLevel::Beginner => 1,
            ProficiencyLevel::Intermediate => 2,
            ProficiencyLevel::Expert => 3,
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProficiencyLevel::Beginner => write!(f, "BEGINNER"),
            ProficiencyLevel::Intermediate => write!(f, "INTERMEDIATE"),
            ProficiencyLevel::Expert => write!(f, "EXPERT"),
        }
    }
}

/// A skill in the corpus, identified by its canonical name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: String,
    pub weight: f64,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl Skill {
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            name: canonical_name(name),
            category: category.to_string(),
            weight: 1.0,
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub name: String,
    pub proficiency_level: ProficiencyLevel,
    pub importance: f64,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSkill {
    pub name: String,
    pub proficiency_level: ProficiencyLevel,
    #[serde(default)]
    pub years_of_experience: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRequirement {
    pub years: f64,
    #[serde(default)]
    pub level: Option<String>,
}

impl ExperienceRequirement {
    /// Pull "N years" out of free-text requirements
    pub fn parse(text: &str) -> Option<Self> {
        static YEARS: OnceLock<Regex> = OnceLock::new();
        let pattern = YEARS.get_or_init(|| {
            Regex::new(r"(?i)(\d+)\+?\s+years?").expect("years pattern is valid")
        });

        let years = pattern
            .captures(text)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())?;

        Some(Self {
            years,
            level: Some(text.trim().to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateExperience {
    pub total_years: f64,
    pub relevant_years: f64,
}

/// A job's skill requirements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub skills: Vec<SkillRequirement>,
    #[serde(default)]
    pub experience: Option<ExperienceRequirement>,
    /// Free-text requirements; experience years are parsed from it when not given
    #[serde(default)]
    pub requirements: Option<String>,
}

/// A candidate's skill profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub skills: Vec<CandidateSkill>,
    #[serde(default)]
    pub experience: Option<CandidateExperience>,
    #[serde(default)]
    pub learning_speed: Option<f64>,
    #[serde(default)]
    pub adaptability_score: Option<f64>,
}

impl JobRequirements {
    /// Fill derived fields and reject malformed records
    pub fn validated(mut self) -> Result<Self> {
        if self.id.trim().is_empty() {
            return Err(SkillAlignerError::Validation("job record has an empty id".to_string()));
        }
        if self.skills.is_empty() {
            return Err(SkillAlignerError::Validation(format!(
                "job '{}' declares no skill requirements", self.id
            )));
        }
        for req in &self.skills {
            if canonical_name(&req.name).is_empty() {
                return Err(SkillAlignerError::Validation(format!(
                    "job '{}' has a requirement with an empty skill name", self.id
                )));
            }
            if !req.importance.is_finite() || !(0.0..=1.0).contains(&req.importance) {
                return Err(SkillAlignerError::Validation(format!(
                    "job '{}': importance of '{}' must be within [0, 1], got {}",
                    self.id, req.name, req.importance
                )));
            }
        }
        if let Some(exp) = &self.experience {
            if !exp.years.is_finite() || exp.years < 0.0 {
                return Err(SkillAlignerError::Validation(format!(
                    "job '{}': required years must be non-negative", self.id
                )));
            }
        }

        if self.experience.is_none() {
            self.experience = self.requirements.as_deref().and_then(ExperienceRequirement::parse);
        }
        Ok(self)
    }

    pub fn required_skills(&self) -> impl Iterator<Item = &SkillRequirement> {
        self.skills.iter().filter(|s| s.required)
    }

    pub fn preferred_skills(&self) -> impl Iterator<Item = &SkillRequirement> {
        self.skills.iter().filter(|s| !s.required)
    }

    pub fn skill_names(&self) -> Vec<String> {
        self.skills.iter().map(|s| canonical_name(&s.name)).collect()
    }
}

impl CandidateProfile {
    pub fn validated(self) -> Result<Self> {
        if self.id.trim().is_empty() {
            return Err(SkillAlignerError::Validation("candidate record has an empty id".to_string()));
        }
        for skill in &self.skills {
            if canonical_name(&skill.name).is_empty() {
                return Err(SkillAlignerError::Validation(format!(
                    "candidate '{}' has a skill with an empty name", self.id
                )));
            }
            if !skill.years_of_experience.is_finite() || skill.years_of_experience < 0.0 {
                return Err(SkillAlignerError::Validation(format!(
                    "candidate '{}': years of experience for '{}' must be non-negative",
                    self.id, skill.name
                )));
            }
        }
        if let Some(exp) = &self.experience {
            if exp.total_years < 0.0 || exp.relevant_years < 0.0 {
                return Err(SkillAlignerError::Validation(format!(
                    "candidate '{}': experience years must be non-negative", self.id
                )));
            }
        }
        for (field, value) in [("learning_speed", self.learning_speed), ("adaptability_score", self.adaptability_score)] {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(SkillAlignerError::Validation(format!(
                        "candidate '{}': {} must be within [0, 1], got {}", self.id, field, v
                    )));
                }
            }
        }
        Ok(self)
    }

    /// Candidate skills keyed by canonical name
    pub fn skill_map(&self) -> HashMap<String, &CandidateSkill> {
        self.skills.iter().map(|s| (canonical_name(&s.name), s)).collect()
    }

    pub fn skill_names(&self) -> Vec<String> {
        self.skills.iter().map(|s| canonical_name(&s.name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(name: &str, importance: f64) -> SkillRequirement {
        SkillRequirement {
            name: name.to_string(),
            proficiency_level: ProficiencyLevel::Intermediate,
            importance,
            required: true,
        }
    }

    #[test]
    fn test_proficiency_ordering() {
        assert!(ProficiencyLevel::Beginner < ProficiencyLevel::Intermediate);
        assert!(ProficiencyLevel::Intermediate < ProficiencyLevel::Expert);
        assert_eq!(ProficiencyLevel::Expert.ordinal(), 3);
    }

    #[test]
    fn test_proficiency_serde_uppercase() {
        let level: ProficiencyLevel = serde_json::from_str("\"EXPERT\"").unwrap();
        assert_eq!(level, ProficiencyLevel::Expert);
        assert_eq!(serde_json::to_string(&ProficiencyLevel::Beginner).unwrap(), "\"BEGINNER\"");
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("  TypeScript "), "typescript");
        assert_eq!(Skill::new(" Rust ", "Systems").name, "rust");
    }

    #[test]
    fn test_experience_parse() {
        let exp = ExperienceRequirement::parse("At least 5 years of experience").unwrap();
        assert_eq!(exp.years, 5.0);
        assert!(ExperienceRequirement::parse("no number here").is_none());
        assert_eq!(ExperienceRequirement::parse("3+ years").unwrap().years, 3.0);
    }

    #[test]
    fn test_job_validation_fills_experience() {
        let job = JobRequirements {
            id: "job-1".into(),
            title: "Developer".into(),
            description: String::new(),
            skills: vec![requirement("Rust", 0.9)],
            experience: None,
            requirements: Some("4 years with systems programming".into()),
        };
        let job = job.validated().unwrap();
        assert_eq!(job.experience.unwrap().years, 4.0);
    }

    #[test]
    fn test_job_validation_rejects_bad_importance() {
        let job = JobRequirements {
            id: "job-1".into(),
            title: "Developer".into(),
            description: String::new(),
            skills: vec![requirement("Rust", 1.5)],
            experience: None,
            requirements: None,
        };
        assert!(matches!(job.validated(), Err(SkillAlignerError::Validation(_))));
    }

    #[test]
    fn test_candidate_validation_rejects_negative_years() {
        let candidate = CandidateProfile {
            id: "c-1".into(),
            name: None,
            skills: vec![CandidateSkill {
                name: "Go".into(),
                proficiency_level: ProficiencyLevel::Beginner,
                years_of_experience: -1.0,
            }],
            experience: None,
            learning_speed: None,
            adaptability_score: None,
        };
        assert!(matches!(candidate.validated(), Err(SkillAlignerError::Validation(_))));
    }
}
