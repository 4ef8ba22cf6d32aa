//! Skill aligner: skill matching and labor-market intelligence engine

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use skill_aligner::cli::{self, Cli, Commands, ConfigAction, OutputArgs};
use skill_aligner::config::{Config, OutputFormat};
use skill_aligner::engine::{EnginePorts, SkillEngine};
use skill_aligner::input::{JsonFileStore, RecordLoader, SkillStore};
use skill_aligner::llm::{MemoryVectorIndex, OfflineReasoner, ReasoningClient, ReasoningService, RetryPolicy};
use skill_aligner::market::sources::{ReasoningMarketSource, SnapshotSource};
use skill_aligner::market::{MarketSource, SystemClock};
use skill_aligner::output::{save_report_to_file, MatchReport, NormalizedSkills, Report, ReportBody, ReportGenerator};
use skill_aligner::processing::embeddings::HashingEmbedder;
use skill_aligner::{Result, SkillAlignerError};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    if let Commands::Config { action } = command {
        return run_config(action, &config);
    }

    let engine = build_engine(config.clone()).await?;
    let reasoning_name = engine.reasoning_service().to_string();
    let started = Instant::now();

    match command {
        Commands::Normalize { skills, output } => {
            let normalized = engine.normalize(&skills).await;
            let body = ReportBody::Normalized(NormalizedSkills {
                input: skills,
                normalized,
            });
            emit(&config, &output, Report::new(body, elapsed_ms(started), &reasoning_name))
        }

        Commands::Match {
            job,
            candidate,
            job_id,
            candidate_id,
            output,
        } => {
            let mut loader = RecordLoader::new();
            let job = match (job, job_id) {
                (Some(path), _) => {
                    validate_record_path(&path, "Job")?;
                    loader.load_job(&path).await?
                }
                (None, Some(id)) => stored_job(engine.store().as_ref(), &id).await?,
                (None, None) => {
                    return Err(SkillAlignerError::InvalidInput("a job file or --job-id is required".to_string()))
                }
            };
            let candidate = match (candidate, candidate_id) {
                (Some(path), _) => {
                    validate_record_path(&path, "Candidate")?;
                    loader.load_candidate(&path).await?
                }
                (None, Some(id)) => stored_candidate(engine.store().as_ref(), &id).await?,
                (None, None) => {
                    return Err(SkillAlignerError::InvalidInput(
                        "a candidate file or --candidate-id is required".to_string(),
                    ))
                }
            };

            println!("🚀 Match analysis");
            println!("💼 Job: {} ({})", job.title, job.id);
            println!("👤 Candidate: {}", candidate.id);

            let spinner = spinner("Scoring candidate...");
            let score = engine.match_score(&job, &candidate).await;
            spinner.finish_and_clear();

            let body = ReportBody::Match(MatchReport {
                job_id: job.id.clone(),
                job_title: job.title.clone(),
                candidate_id: candidate.id.clone(),
                score: score?,
            });
            emit(&config, &output, Report::new(body, elapsed_ms(started), &reasoning_name))
        }

        Commands::Gap { job, candidate, output } => {
            validate_record_path(&job, "Job")?;
            validate_record_path(&candidate, "Candidate")?;
            let mut loader = RecordLoader::new();
            let job = loader.load_job(&job).await?;
            let candidate = loader.load_candidate(&candidate).await?;

            let spinner = spinner("Analyzing skill gaps...");
            let path = engine.analyze_gap(&candidate.skills, &job.skills).await;
            spinner.finish_and_clear();

            emit(
                &config,
                &output,
                Report::new(ReportBody::LearningPath(path), elapsed_ms(started), &reasoning_name),
            )
        }

        Commands::Market { skill, output } => {
            info!("Aggregating market data from: {}", engine.source_ids().join(", "));
            let spinner = spinner(&format!("Querying market sources for '{}'...", skill));
            let signal = engine.aggregate(&skill).await;
            spinner.finish_and_clear();

            emit(
                &config,
                &output,
                Report::new(ReportBody::MarketSignal(signal?), elapsed_ms(started), &reasoning_name),
            )
        }

        Commands::Insights { output } => {
            let spinner = spinner("Generating market insights...");
            let report = engine.generate_market_insights().await;
            spinner.finish_and_clear();

            emit(
                &config,
                &output,
                Report::new(ReportBody::MarketInsights(report?), elapsed_ms(started), &reasoning_name),
            )
        }

        Commands::Ingest { job, candidate, output } => {
            if job.is_empty() && candidate.is_empty() {
                return Err(SkillAlignerError::InvalidInput(
                    "nothing to ingest; pass --job and/or --candidate".to_string(),
                ));
            }

            let mut loader = RecordLoader::new();
            for path in &candidate {
                validate_record_path(path, "Candidate")?;
                let record = loader.load_candidate(path).await?;
                let id = record.id.clone();
                engine.save_candidate(record).await?;
                println!("✅ Stored candidate '{}'", id);
            }

            for path in &job {
                validate_record_path(path, "Job")?;
                let record = loader.load_job(path).await?;
                let spinner = spinner(&format!("Processing job '{}'...", record.id));
                let processed = engine.process_job(record).await;
                spinner.finish_and_clear();

                emit(
                    &config,
                    &output,
                    Report::new(ReportBody::Ingested(processed?), elapsed_ms(started), &reasoning_name),
                )?;
            }
            Ok(())
        }

        Commands::Config { .. } => Ok(()),
    }
}

fn run_config(action: Option<ConfigAction>, config: &Config) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            println!("⚙️  Current Configuration\n");
            println!("Data Directory: {}", config.data_dir().display());
            println!("\nScoring Weights:");
            println!("  Skill match: {:.2}%", config.scoring.skill_weight * 100.0);
            println!("  Proficiency: {:.2}%", config.scoring.proficiency_weight * 100.0);
            println!("  Market alignment: {:.2}%", config.scoring.market_weight * 100.0);
            println!("  Learning potential: {:.2}%", config.scoring.learning_weight * 100.0);
            println!("  Experience: {:.2}%", config.scoring.experience_weight * 100.0);
            println!("  Semantic blend: {:.2}", config.scoring.semantic_blend_weight);
            println!("\nMarket:");
            println!("  Cache TTL: {}h", config.market.cache_ttl_hours);
            println!("  Source timeout: {}s", config.market.source_timeout_secs);
            for source in &config.market.sources {
                let origin = match &source.snapshot {
                    Some(path) => config.resolve_snapshot(path).display().to_string(),
                    None => "reasoning service".to_string(),
                };
                println!("  {} (weight {:.2}): {}", source.id, source.weight, origin);
            }
            println!("\nReasoning: {} attempt(s), {}s timeout", config.reasoning.max_attempts, config.reasoning.timeout_secs);
            println!("Clustering: k={}, max {} iterations", config.clustering.k, config.clustering.max_iterations);
        }

        Some(ConfigAction::Reset) => {
            println!("🔄 Resetting configuration to defaults...");
            let default_config = Config::default();
            default_config.save()?;
            println!("✅ Configuration reset successfully!");
        }

        Some(ConfigAction::Path) => {
            println!("{}", Config::config_path().display());
        }
    }
    Ok(())
}

async fn build_engine(config: Config) -> Result<SkillEngine> {
    config.ensure_data_dir()?;

    let store: Arc<dyn SkillStore> = Arc::new(JsonFileStore::in_dir(config.data_dir()).await?);
    let reasoner: Arc<dyn ReasoningService> = Arc::new(OfflineReasoner::new()?);
    let source_client = Arc::new(ReasoningClient::new(
        reasoner.clone(),
        RetryPolicy::from_config(&config.reasoning),
    ));

    let mut sources: Vec<Arc<dyn MarketSource>> = Vec::new();
    for source in &config.market.sources {
        match &source.snapshot {
            Some(snapshot) => {
                let path = config.resolve_snapshot(snapshot);
                if !path.exists() {
                    warn!("Snapshot for source '{}' not found at {}; skipping it", source.id, path.display());
                    continue;
                }
                let loaded = SnapshotSource::load(&source.id, source.weight, &path).await?;
                info!("Source '{}' serves {} skill(s)", source.id, loaded.len());
                sources.push(Arc::new(loaded));
            }
            None => sources.push(Arc::new(ReasoningMarketSource::new(
                &source.id,
                source.weight,
                source_client.clone(),
            ))),
        }
    }

    let ports = EnginePorts {
        store,
        sources,
        reasoning: reasoner,
        embeddings: Arc::new(HashingEmbedder::new(config.clustering.embedding_dimensions)),
        vectors: Arc::new(MemoryVectorIndex::new()),
        clock: Arc::new(SystemClock),
    };
    SkillEngine::new(config, ports)
}

async fn stored_job(store: &dyn SkillStore, id: &str) -> Result<skill_aligner::processing::profile::JobRequirements> {
    store
        .get_job(id)
        .await?
        .ok_or_else(|| SkillAlignerError::NotFound(format!("job '{}'", id)))
}

async fn stored_candidate(store: &dyn SkillStore, id: &str) -> Result<skill_aligner::processing::profile::CandidateProfile> {
    store
        .get_candidate(id)
        .await?
        .ok_or_else(|| SkillAlignerError::NotFound(format!("candidate '{}'", id)))
}

fn validate_record_path(path: &std::path::Path, label: &str) -> Result<()> {
    cli::validate_file_extension(path, &["json", "toml"])
        .map_err(|e| SkillAlignerError::InvalidInput(format!("{} file: {}", label, e)))
}

fn emit(config: &Config, args: &OutputArgs, report: Report) -> Result<()> {
    let format = match &args.output {
        Some(format) => cli::parse_output_format(format).map_err(SkillAlignerError::InvalidInput)?,
        None => config.output.format,
    };
    let generator = ReportGenerator::with_options(
        config.output.color_output && args.save.is_none(),
        args.detailed || config.output.detailed,
        true,
        true,
    );
    let content = generator.generate_report(&report, &format)?;

    match &args.save {
        Some(path) => {
            save_report_to_file(&content, path)?;
            println!("💾 Report saved to: {}", path.display());
        }
        None => {
            if format == OutputFormat::Console {
                println!("{}", content);
            } else {
                print!("{}", content);
                if !content.ends_with('\n') {
                    println!();
                }
            }
        }
    }
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
