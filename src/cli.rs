//! CLI interface for the skill aligner

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "skill-aligner")]
#[command(about = "Skill matching and labor-market intelligence engine")]
#[command(long_about = "Normalize skills, score candidates against jobs, plan learning paths and track market demand")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Rendering flags shared by every reporting command
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format: console, json, markdown
    #[arg(short, long)]
    pub output: Option<String>,

    /// Save output to file
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Include prerequisites, resources and run details
    #[arg(short, long)]
    pub detailed: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Canonicalize a list of skill names
    Normalize {
        /// Raw skill names
        #[arg(required = true)]
        skills: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Score a candidate against a job
    Match {
        /// Path to job record (JSON, TOML)
        #[arg(short, long, required_unless_present = "job_id")]
        job: Option<PathBuf>,

        /// Path to candidate record (JSON, TOML)
        #[arg(short = 'k', long, required_unless_present = "candidate_id")]
        candidate: Option<PathBuf>,

        /// Id of a previously ingested job
        #[arg(long, conflicts_with = "job")]
        job_id: Option<String>,

        /// Id of a previously ingested candidate
        #[arg(long, conflicts_with = "candidate")]
        candidate_id: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build a learning path from a candidate's gaps against a job
    Gap {
        /// Path to job record (JSON, TOML)
        #[arg(short, long)]
        job: PathBuf,

        /// Path to candidate record (JSON, TOML)
        #[arg(short = 'k', long)]
        candidate: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Aggregate market demand for a skill
    Market {
        /// Skill name
        skill: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Report trends, emerging skills, clusters and recommendations over the stored corpus
    Insights {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Store job and candidate records for later matching
    Ingest {
        /// Job record files to process and store
        #[arg(short, long)]
        job: Vec<PathBuf>,

        /// Candidate record files to store
        #[arg(short = 'k', long)]
        candidate: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_match_by_id() {
        let cli = Cli::try_parse_from(["skill-aligner", "match", "--job-id", "job-1", "--candidate-id", "cand-1"]).unwrap();
        match cli.command {
            Commands::Match { job_id, candidate_id, job, .. } => {
                assert_eq!(job_id.as_deref(), Some("job-1"));
                assert_eq!(candidate_id.as_deref(), Some("cand-1"));
                assert!(job.is_none());
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD").unwrap(), OutputFormat::Markdown);
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("job.json"), &["json", "toml"]).is_ok());
        assert!(validate_file_extension(Path::new("job.pdf"), &["json", "toml"]).is_err());
        assert!(validate_file_extension(Path::new("job"), &["json"]).is_err());
    }
}
