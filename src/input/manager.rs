//! Loader for job and candidate record files

use crate::error::{Result, SkillAlignerError};
use crate::input::file_detector::RecordFormat;
use crate::processing::profile::{CandidateProfile, JobRequirements};
use log::{debug, info};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct RecordLoader {
    cache: HashMap<PathBuf, String>,
    enable_cache: bool,
}

impl Default for RecordLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLoader {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Read and validate a job record (JSON or TOML)
    pub async fn load_job(&mut self, path: &Path) -> Result<JobRequirements> {
        let job: JobRequirements = self.load(path).await?;
        let job = job.validated()?;
        info!("Loaded job '{}' ({} skill requirement(s))", job.id, job.skills.len());
        Ok(job)
    }

    /// Read and validate a candidate record (JSON or TOML)
    pub async fn load_candidate(&mut self, path: &Path) -> Result<CandidateProfile> {
        let candidate: CandidateProfile = self.load(path).await?;
        let candidate = candidate.validated()?;
        info!("Loaded candidate '{}' ({} skill(s))", candidate.id, candidate.skills.len());
        Ok(candidate)
    }

    async fn load<T: DeserializeOwned>(&mut self, path: &Path) -> Result<T> {
        let format = self.detect_format(path)?;
        let content = self.read(path).await?;

        match format {
            RecordFormat::Json => serde_json::from_str(&content).map_err(|e| {
                SkillAlignerError::Validation(format!("{} is not a valid record: {}", path.display(), e))
            }),
            RecordFormat::Toml => toml::from_str(&content).map_err(|e| {
                SkillAlignerError::Validation(format!("{} is not a valid record: {}", path.display(), e))
            }),
            RecordFormat::Unknown => Err(SkillAlignerError::UnsupportedFormat(format!(
                "Unsupported record type for: {}",
                path.display()
            ))),
        }
    }

    async fn read(&mut self, path: &Path) -> Result<String> {
        if self.enable_cache {
            if let Some(cached) = self.cache.get(path) {
                debug!("Using cached record for: {}", path.display());
                return Ok(cached.clone());
            }
        }

        if !path.exists() {
            return Err(SkillAlignerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let content = tokio::fs::read_to_string(path).await?;
        if self.enable_cache {
            self.cache.insert(path.to_path_buf(), content.clone());
        }
        Ok(content)
    }

    fn detect_format(&self, path: &Path) -> Result<RecordFormat> {
        if path.extension().is_none() {
            return Err(SkillAlignerError::InvalidInput(format!(
                "File has no extension: {}",
                path.display()
            )));
        }
        Ok(RecordFormat::from_path(path))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
