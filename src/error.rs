//! Error handling for the skill aligner engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillAlignerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("External service '{service}' failed: {message}")]
    ExternalService { service: String, message: String },

    #[error("Operation '{operation}' timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Response did not match expected schema ({expected}): {detail}")]
    SchemaMismatch { expected: &'static str, detail: String },

    #[error("No market data available for skill '{skill}'")]
    NoDataAvailable { skill: String },

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),
}

impl SkillAlignerError {
    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        SkillAlignerError::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn schema(expected: &'static str, detail: impl Into<String>) -> Self {
        SkillAlignerError::SchemaMismatch {
            expected,
            detail: detail.into(),
        }
    }

    /// Whether a documented fallback may stand in for this failure.
    ///
    /// Validation problems, missing records and aggregations with zero usable
    /// sources must reach the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SkillAlignerError::ExternalService { .. }
                | SkillAlignerError::Timeout { .. }
                | SkillAlignerError::SchemaMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SkillAlignerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for SkillAlignerError {
    fn from(err: anyhow::Error) -> Self {
        SkillAlignerError::external("internal", err.to_string())
    }
}

impl From<toml::de::Error> for SkillAlignerError {
    fn from(err: toml::de::Error) -> Self {
        SkillAlignerError::Configuration(format!("Failed to parse TOML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(SkillAlignerError::external("reasoner", "boom").is_recoverable());
        assert!(SkillAlignerError::schema("json array", "got object").is_recoverable());
        assert!(SkillAlignerError::Timeout { operation: "normalize".into(), after_ms: 10 }.is_recoverable());

        assert!(!SkillAlignerError::Validation("missing job".into()).is_recoverable());
        assert!(!SkillAlignerError::NoDataAvailable { skill: "rust".into() }.is_recoverable());
        assert!(!SkillAlignerError::NotFound("job-1".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = SkillAlignerError::NoDataAvailable { skill: "cobol".into() };
        assert_eq!(err.to_string(), "No market data available for skill 'cobol'");
    }
}
