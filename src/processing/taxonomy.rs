//! Built-in skill vocabulary: aliases, categories and common prerequisites

use crate::error::{Result, SkillAlignerError};
use crate::processing::profile::canonical_name;
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::HashMap;

/// Vocabulary lookups used by the offline reasoner and ingestion
pub struct SkillTaxonomy {
    category_matcher: AhoCorasick,
    keywords: Vec<(String, &'static str)>,
    aliases: HashMap<String, String>,
    prerequisites: HashMap<String, Vec<String>>,
}

pub const UNCATEGORIZED: &str = "Uncategorized";

impl SkillTaxonomy {
    pub fn new() -> Result<Self> {
        let mut keywords: Vec<(String, &'static str)> = default_categories()
            .iter()
            .flat_map(|(category, skills)| skills.iter().map(move |s| (s.to_string(), *category)))
            .collect();

        // Longest first so "react native" wins over "react"
        keywords.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let patterns: Vec<&str> = keywords.iter().map(|(k, _)| k.as_str()).collect();
        let category_matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| SkillAlignerError::Configuration(format!("Failed to build skill taxonomy: {}", e)))?;

        let aliases = default_aliases()
            .iter()
            .map(|(alias, name)| (alias.to_string(), name.to_string()))
            .collect();

        let prerequisites = default_prerequisites()
            .iter()
            .map(|(skill, prereqs)| (skill.to_string(), prereqs.iter().map(|p| p.to_string()).collect()))
            .collect();

        Ok(Self {
            category_matcher,
            keywords,
            aliases,
            prerequisites,
        })
    }

    /// Resolve known aliases ("js", "k8s", "reactjs") to the vocabulary name
    pub fn canonicalize(&self, name: &str) -> String {
        let name = canonical_name(name);
        match self.aliases.get(&name) {
            Some(resolved) => resolved.clone(),
            None => name,
        }
    }

    /// Category of a single skill. Keyword hits must sit on word boundaries,
    /// so "go" does not match inside "django".
    pub fn category_of(&self, skill: &str) -> Option<&'static str> {
        let skill = self.canonicalize(skill);
        let bytes = skill.as_bytes();

        self.category_matcher.find_iter(&skill).find_map(|mat| {
            let before_ok = mat.start() == 0 || !bytes[mat.start() - 1].is_ascii_alphanumeric();
            let after_ok = mat.end() == bytes.len() || !bytes[mat.end()].is_ascii_alphanumeric();
            (before_ok && after_ok).then(|| self.keywords[mat.pattern().as_usize()].1)
        })
    }

    /// Most common category across a group of skills
    pub fn label_for(&self, skills: &[String]) -> Option<&'static str> {
        let mut votes: HashMap<&'static str, usize> = HashMap::new();
        for skill in skills {
            if let Some(category) = self.category_of(skill) {
                *votes.entry(category).or_insert(0) += 1;
            }
        }

        // Ties go to the alphabetically first category to keep labels stable
        votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(category, _)| category)
    }

    pub fn prerequisites_of(&self, skill: &str) -> &[String] {
        self.prerequisites
            .get(&self.canonicalize(skill))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn default_categories() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        (
            "Programming Languages",
            &[
                "rust", "python", "javascript", "typescript", "java", "c++", "c#", "go", "ruby", "php",
                "swift", "kotlin", "scala", "haskell", "clojure", "r", "matlab",
            ],
        ),
        (
            "Frontend Development",
            &[
                "react", "vue", "angular", "svelte", "html", "css", "sass", "less", "tailwind", "bootstrap",
                "jquery", "webpack", "vite", "babel", "nextjs", "nuxt", "gatsby", "remix", "redux",
            ],
        ),
        (
            "Backend Development",
            &[
                "node.js", "express", "django", "flask", "spring", "rails", "microservices", "api", "rest",
                "graphql", "grpc",
            ],
        ),
        (
            "DevOps",
            &[
                "docker", "kubernetes", "terraform", "ansible", "jenkins", "gitlab", "github", "cicd",
                "devops", "nginx", "linux", "bash", "git",
            ],
        ),
        ("Cloud Computing", &["aws", "azure", "gcp", "cloud", "serverless", "lambda"]),
        (
            "Databases",
            &[
                "postgresql", "mysql", "mongodb", "cassandra", "dynamodb", "sqlite", "oracle", "sql server",
                "neo4j", "influxdb", "redis", "elasticsearch", "sql",
            ],
        ),
        (
            "Data Science",
            &["pandas", "numpy", "jupyter", "spark", "hadoop", "kafka", "airflow", "statistics", "data analysis"],
        ),
        (
            "Machine Learning",
            &["machine learning", "deep learning", "tensorflow", "pytorch", "sklearn", "nlp", "computer vision"],
        ),
        ("Mobile Development", &["react native", "flutter", "android", "ios", "swiftui"]),
        ("Testing", &["jest", "pytest", "junit", "selenium", "cypress", "testing", "tdd", "bdd"]),
        (
            "Soft Skills",
            &[
                "leadership", "communication", "teamwork", "problem solving", "critical thinking", "mentoring",
                "project management", "collaboration", "agile", "scrum",
            ],
        ),
    ]
}

fn default_aliases() -> &'static [(&'static str, &'static str)] {
    &[
        ("js", "javascript"),
        ("ecmascript", "javascript"),
        ("ts", "typescript"),
        ("reactjs", "react"),
        ("react.js", "react"),
        ("vuejs", "vue"),
        ("vue.js", "vue"),
        ("angularjs", "angular"),
        ("next.js", "nextjs"),
        ("node", "node.js"),
        ("nodejs", "node.js"),
        ("golang", "go"),
        ("py", "python"),
        ("python3", "python"),
        ("k8s", "kubernetes"),
        ("postgres", "postgresql"),
        ("mongo", "mongodb"),
        ("ml", "machine learning"),
        ("dl", "deep learning"),
        ("scikit-learn", "sklearn"),
        ("amazon web services", "aws"),
        ("google cloud", "gcp"),
        ("google cloud platform", "gcp"),
        ("c sharp", "c#"),
        ("cpp", "c++"),
        ("ci/cd", "cicd"),
        ("rest api", "rest"),
        ("restful", "rest"),
    ]
}

fn default_prerequisites() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("typescript", &["javascript"]),
        ("react", &["javascript", "html", "css"]),
        ("vue", &["javascript", "html", "css"]),
        ("angular", &["typescript", "html", "css"]),
        ("svelte", &["javascript"]),
        ("redux", &["react"]),
        ("nextjs", &["react"]),
        ("react native", &["react"]),
        ("sass", &["css"]),
        ("tailwind", &["css"]),
        ("node.js", &["javascript"]),
        ("express", &["node.js"]),
        ("django", &["python"]),
        ("flask", &["python"]),
        ("rails", &["ruby"]),
        ("spring", &["java"]),
        ("graphql", &["api"]),
        ("docker", &["linux"]),
        ("kubernetes", &["docker"]),
        ("terraform", &["cloud"]),
        ("pandas", &["python"]),
        ("numpy", &["python"]),
        ("sklearn", &["python", "machine learning"]),
        ("machine learning", &["python", "statistics"]),
        ("deep learning", &["machine learning"]),
        ("tensorflow", &["deep learning"]),
        ("pytorch", &["deep learning"]),
        ("spark", &["sql"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        let taxonomy = SkillTaxonomy::new().unwrap();
        assert_eq!(taxonomy.canonicalize(" JS "), "javascript");
        assert_eq!(taxonomy.canonicalize("K8s"), "kubernetes");
        assert_eq!(taxonomy.canonicalize("Rust"), "rust");
    }

    #[test]
    fn test_category_respects_word_boundaries() {
        let taxonomy = SkillTaxonomy::new().unwrap();
        assert_eq!(taxonomy.category_of("Django"), Some("Backend Development"));
        assert_eq!(taxonomy.category_of("React Native"), Some("Mobile Development"));
        assert_eq!(taxonomy.category_of("reactjs"), Some("Frontend Development"));
        assert_eq!(taxonomy.category_of("underwater basket weaving"), None);
    }

    #[test]
    fn test_label_for_group() {
        let taxonomy = SkillTaxonomy::new().unwrap();
        let skills = vec!["react".to_string(), "css".to_string(), "postgresql".to_string()];
        assert_eq!(taxonomy.label_for(&skills), Some("Frontend Development"));
        assert_eq!(taxonomy.label_for(&[]), None);
    }

    #[test]
    fn test_prerequisites() {
        let taxonomy = SkillTaxonomy::new().unwrap();
        assert_eq!(taxonomy.prerequisites_of("TS"), &["javascript".to_string()]);
        assert!(taxonomy.prerequisites_of("javascript").is_empty());
    }
}
