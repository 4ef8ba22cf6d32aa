//! Durable store port and its in-memory and JSON-file implementations

use crate::error::{Result, SkillAlignerError};
use crate::market::MarketSignal;
use crate::processing::profile::{canonical_name, CandidateProfile, JobRequirements, Skill};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Upsert-by-key and get-by-key for every record the engine persists.
/// Skills and signals are keyed by canonical skill name, jobs and
/// candidates by id.
#[async_trait]
pub trait SkillStore: Send + Sync {
    async fn upsert_skill(&self, skill: Skill) -> Result<()>;

    /// Upsert several skills; implementations with costly writes persist once
    async fn upsert_skills(&self, skills: Vec<Skill>) -> Result<()> {
        for skill in skills {
            self.upsert_skill(skill).await?;
        }
        Ok(())
    }

    async fn get_skill(&self, name: &str) -> Result<Option<Skill>>;
    async fn list_skills(&self) -> Result<Vec<Skill>>;

    async fn upsert_signal(&self, signal: MarketSignal) -> Result<()>;
    async fn get_signal(&self, skill: &str) -> Result<Option<MarketSignal>>;
    async fn list_signals(&self) -> Result<Vec<MarketSignal>>;

    async fn upsert_job(&self, job: JobRequirements) -> Result<()>;
    async fn get_job(&self, id: &str) -> Result<Option<JobRequirements>>;

    async fn upsert_candidate(&self, candidate: CandidateProfile) -> Result<()>;
    async fn get_candidate(&self, id: &str) -> Result<Option<CandidateProfile>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    skills: BTreeMap<String, Skill>,
    #[serde(default)]
    signals: BTreeMap<String, MarketSignal>,
    #[serde(default)]
    jobs: BTreeMap<String, JobRequirements>,
    #[serde(default)]
    candidates: BTreeMap<String, CandidateProfile>,
}

impl StoreData {
    fn put_skill(&mut self, mut skill: Skill) {
        skill.name = canonical_name(&skill.name);
        self.skills.insert(skill.name.clone(), skill);
    }

    fn put_signal(&mut self, mut signal: MarketSignal) {
        signal.skill = canonical_name(&signal.skill);
        self.signals.insert(signal.skill.clone(), signal);
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SkillStore for MemoryStore {
    async fn upsert_skill(&self, skill: Skill) -> Result<()> {
        self.data.write().await.put_skill(skill);
        Ok(())
    }

    async fn get_skill(&self, name: &str) -> Result<Option<Skill>> {
        Ok(self.data.read().await.skills.get(&canonical_name(name)).cloned())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>> {
        Ok(self.data.read().await.skills.values().cloned().collect())
    }

    async fn upsert_signal(&self, signal: MarketSignal) -> Result<()> {
        self.data.write().await.put_signal(signal);
        Ok(())
    }

    async fn get_signal(&self, skill: &str) -> Result<Option<MarketSignal>> {
        Ok(self.data.read().await.signals.get(&canonical_name(skill)).cloned())
    }

    async fn list_signals(&self) -> Result<Vec<MarketSignal>> {
        Ok(self.data.read().await.signals.values().cloned().collect())
    }

    async fn upsert_job(&self, job: JobRequirements) -> Result<()> {
        self.data.write().await.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobRequirements>> {
        Ok(self.data.read().await.jobs.get(id).cloned())
    }

    async fn upsert_candidate(&self, candidate: CandidateProfile) -> Result<()> {
        self.data.write().await.candidates.insert(candidate.id.clone(), candidate);
        Ok(())
    }

    async fn get_candidate(&self, id: &str) -> Result<Option<CandidateProfile>> {
        Ok(self.data.read().await.candidates.get(id).cloned())
    }
}

/// Store persisted as a single JSON document. Every write rewrites the file
/// through a temporary sibling and a rename.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<StoreData>,
}

impl JsonFileStore {
    pub const FILE_NAME: &'static str = "store.json";

    /// Open the document at `path`, starting empty if it does not exist yet
    pub async fn open(path: &Path) -> Result<Self> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                SkillAlignerError::Store(format!("{} is not a valid store document: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened store at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
        })
    }

    /// Open `store.json` inside a data directory
    pub async fn in_dir(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        Self::open(&dir.join(Self::FILE_NAME)).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| SkillAlignerError::Store(format!("failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SkillAlignerError::Store(format!("failed to replace {}: {}", self.path.display(), e)))
    }

    async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreData) + Send,
    {
        let mut data = self.data.write().await;
        change(&mut *data);
        self.persist(&*data).await
    }
}

#[async_trait]
impl SkillStore for JsonFileStore {
    async fn upsert_skill(&self, skill: Skill) -> Result<()> {
        self.update(|data| data.put_skill(skill)).await
    }

    async fn upsert_skills(&self, skills: Vec<Skill>) -> Result<()> {
        self.update(|data| {
            for skill in skills {
                data.put_skill(skill);
            }
        })
        .await
    }

    async fn get_skill(&self, name: &str) -> Result<Option<Skill>> {
        Ok(self.data.read().await.skills.get(&canonical_name(name)).cloned())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>> {
        Ok(self.data.read().await.skills.values().cloned().collect())
    }

    async fn upsert_signal(&self, signal: MarketSignal) -> Result<()> {
        self.update(|data| data.put_signal(signal)).await
    }

    async fn get_signal(&self, skill: &str) -> Result<Option<MarketSignal>> {
        Ok(self.data.read().await.signals.get(&canonical_name(skill)).cloned())
    }

    async fn list_signals(&self) -> Result<Vec<MarketSignal>> {
        Ok(self.data.read().await.signals.values().cloned().collect())
    }

    async fn upsert_job(&self, job: JobRequirements) -> Result<()> {
        self.update(|data| {
            data.jobs.insert(job.id.clone(), job);
        })
        .await
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobRequirements>> {
        Ok(self.data.read().await.jobs.get(id).cloned())
    }

    async fn upsert_candidate(&self, candidate: CandidateProfile) -> Result<()> {
        self.update(|data| {
            data.candidates.insert(candidate.id.clone(), candidate);
        })
        .await
    }

    async fn get_candidate(&self, id: &str) -> Result<Option<CandidateProfile>> {
        Ok(self.data.read().await.candidates.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Trend;
    use chrono::Utc;

    fn signal(skill: &str, score: f64) -> MarketSignal {
        MarketSignal {
            skill: skill.to_string(),
            trend: Trend::Stable,
            score,
            job_count: 10,
            avg_salary: 0.0,
            sources: vec!["github".to_string()],
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_keys_are_canonical() {
        let store = MemoryStore::new();
        store.upsert_skill(Skill::new("TypeScript", "Programming Languages")).await.unwrap();
        store.upsert_signal(signal(" Rust", 0.4)).await.unwrap();
        store.upsert_signal(signal("rust", 0.9)).await.unwrap();

        assert!(store.get_skill("typescript").await.unwrap().is_some());
        assert_eq!(store.list_signals().await.unwrap().len(), 1);
        assert_eq!(store.get_signal("RUST").await.unwrap().unwrap().score, 0.9);
        assert!(store.get_job("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = JsonFileStore::in_dir(dir.path()).await.unwrap();
            store.upsert_signal(signal("go", 0.6)).await.unwrap();
            store
                .upsert_skill(Skill::new("go", "Programming Languages").with_embedding(vec![0.5, 0.5]))
                .await
                .unwrap();
        }

        let reopened = JsonFileStore::in_dir(dir.path()).await.unwrap();
        assert_eq!(reopened.get_signal("go").await.unwrap().unwrap().score, 0.6);
        let skill = reopened.get_skill("go").await.unwrap().unwrap();
        assert_eq!(skill.embedding, Some(vec![0.5, 0.5]));
    }

    #[tokio::test]
    async fn test_json_store_batch_upsert() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = JsonFileStore::in_dir(dir.path()).await.unwrap();
            store
                .upsert_skills(vec![
                    Skill::new("Docker", "DevOps"),
                    Skill::new("kubernetes", "DevOps"),
                    Skill::new(" docker ", "Containers"),
                ])
                .await
                .unwrap();
        }

        let reopened = JsonFileStore::in_dir(dir.path()).await.unwrap();
        let skills = reopened.list_skills().await.unwrap();
        assert_eq!(skills.len(), 2);
        assert_eq!(reopened.get_skill("docker").await.unwrap().unwrap().category, "Containers");
        assert!(!dir.path().join("store.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_json_store_rejects_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JsonFileStore::FILE_NAME);
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(JsonFileStore::open(&path).await, Err(SkillAlignerError::Store(_))));
    }
}
