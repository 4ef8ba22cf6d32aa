//! Output formatters - console, JSON and Markdown renderings of engine reports

use crate::config::OutputFormat;
use crate::engine::ProcessedJob;
use crate::error::Result;
use crate::market::insights::MarketInsightsReport;
use crate::market::{MarketSignal, Trend};
use crate::output::report::*;
use crate::processing::gap_analyzer::{LearningPath, SkillGap};
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting reports
pub trait OutputFormatter {
    fn format_report(&self, report: &Report) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for structured output
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for documentation
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_trend(&self, trend: Trend) -> String {
        let (icon, color) = match trend {
            Trend::Rising => ("↑", Color::Green),
            Trend::Stable => ("→", Color::Yellow),
            Trend::Declining => ("↓", Color::Red),
        };
        self.colorize(&format!("{} {}", icon, trend), color)
    }

    fn format_match(&self, report: &MatchReport) -> String {
        let mut output = String::new();
        let score = &report.score;

        output.push_str(&self.format_header("Executive Summary", 2));
        output.push_str(&format!(
            "Job: {} ({}) | Candidate: {}\n",
            report.job_title, report.job_id, report.candidate_id
        ));
        output.push_str(&format!(
            "Overall Score: {}% {}\n",
            report.percentage(),
            self.format_score_badge(report.percentage())
        ));

        output.push_str(&self.format_header("Score Breakdown", 3));
        let b = &score.breakdown;
        for (label, value) in [
            ("🎯 Skill Match", b.skill_match),
            ("📈 Proficiency Match", b.proficiency_match),
            ("💼 Market Alignment", b.market_alignment),
            ("🌱 Learning Potential", b.learning_potential),
            ("⏳ Experience Match", b.experience_match),
        ] {
            output.push_str(&format!("{}: {}%\n", label, percentage(value)));
        }

        if !score.insights.is_empty() {
            output.push_str(&self.format_header("💡 Insights", 3));
            for insight in &score.insights {
                output.push_str(&format!("  • {}\n", self.colorize(insight, Color::Cyan)));
            }
        }

        output.push_str(&self.format_learning_path(&score.gap_analysis));
        output
    }

    fn format_learning_path(&self, path: &LearningPath) -> String {
        let mut output = String::new();
        output.push_str(&self.format_header("🧭 Learning Path", 3));

        if path.is_empty() {
            output.push_str(&format!("  {}\n", self.colorize("No skill gaps - all requirements met", Color::Green)));
            return output;
        }

        output.push_str(&format!(
            "Total time: {} | Total cost: {} | Difficulty: {}\n\n",
            path.total_time, path.total_cost, path.difficulty
        ));
        for (i, gap) in path.gaps.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, self.format_gap(gap)));
            if self.detailed {
                if !gap.prerequisites.is_empty() {
                    output.push_str(&format!("     Prerequisites: {}\n", gap.prerequisites.join(", ")));
                }
                for resource in &gap.resources {
                    output.push_str(&format!(
                        "     - {} ({}, {}, {})\n",
                        resource.title, resource.provider, resource.duration, resource.cost
                    ));
                }
            }
        }
        output
    }

    fn format_gap(&self, gap: &SkillGap) -> String {
        let levels = match gap.current_level {
            Some(current) => format!("{} → {}", current, gap.required_level),
            None => format!("missing → {}", gap.required_level),
        };
        let color = if gap.required { Color::Red } else { Color::Yellow };
        format!(
            "{} [{}] {} (importance {:.2})",
            self.colorize(&gap.skill, color),
            levels,
            gap.time_to_acquire,
            gap.importance
        )
    }

    fn format_signal(&self, signal: &MarketSignal) -> String {
        let mut output = String::new();
        output.push_str(&self.format_header(&format!("💹 {}", signal.skill), 2));
        output.push_str(&format!("Score: {:.2} | Trend: {}\n", signal.score, self.format_trend(signal.trend)));
        output.push_str(&format!("Job postings: {}\n", signal.job_count));
        if signal.avg_salary > 0.0 {
            output.push_str(&format!("Average salary: ${:.0}\n", signal.avg_salary));
        }
        output.push_str(&format!("Sources: {}\n", signal.sources.join(", ")));
        output.push_str(&format!("Updated: {}\n", signal.last_updated.format("%Y-%m-%d %H:%M:%S UTC")));
        output
    }

    fn format_insights(&self, report: &MarketInsightsReport) -> String {
        let mut output = String::new();

        output.push_str(&self.format_header("Market Trends", 2));
        for (trend, skills) in [
            (Trend::Rising, &report.trends.rising),
            (Trend::Stable, &report.trends.stable),
            (Trend::Declining, &report.trends.declining),
        ] {
            let list = if skills.is_empty() { "-".to_string() } else { skills.join(", ") };
            output.push_str(&format!("{}: {}\n", self.format_trend(trend), list));
        }

        if !report.emerging_skills.is_empty() {
            output.push_str(&self.format_header("🚀 Emerging Skills", 3));
            output.push_str(&format!("  {}\n", report.emerging_skills.join(", ")));
        }

        if !report.clusters.is_empty() {
            output.push_str(&self.format_header("🧩 Skill Clusters", 3));
            for cluster in &report.clusters {
                output.push_str(&format!(
                    "  {} (demand {:.2}, growth {:+.2}): {}\n",
                    self.colorize(&cluster.category, Color::Cyan),
                    cluster.market_demand,
                    cluster.growth_rate,
                    cluster.skills.join(", ")
                ));
            }
        }

        output.push_str(&self.format_header("📋 Recommendations", 3));
        for recommendation in &report.recommendations {
            output.push_str(&format!("  • {}\n", recommendation));
        }
        output
    }

    fn format_ingested(&self, processed: &ProcessedJob) -> String {
        let mut output = String::new();
        output.push_str(&self.format_header(&format!("📥 {}", processed.job.title), 2));
        output.push_str(&format!("Stored as: {}\n", processed.job.id));
        output.push_str(&format!("Skills: {}\n", processed.job.skill_names().join(", ")));
        output.push_str(&format!(
            "Embedding: {}\n",
            match &processed.embedding {
                Some(v) => format!("{} dimensions", v.len()),
                None => "unavailable".to_string(),
            }
        ));
        for signal in &processed.market_data {
            output.push_str(&format!(
                "  {} {:.2} {}\n",
                signal.skill,
                signal.score,
                self.format_trend(signal.trend)
            ));
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &Report) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header(&format!("📊 {}", report.title().to_uppercase()), 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.processing_time_ms
        ));

        let body = match &report.body {
            ReportBody::Normalized(skills) => {
                let mut out = String::new();
                for (raw, normalized) in skills.input.iter().zip(skills.normalized.iter()) {
                    out.push_str(&format!("  {} → {}\n", raw, self.colorize(normalized, Color::Green)));
                }
                if skills.input.len() != skills.normalized.len() {
                    out.push_str(&format!("\nNormalized: {}\n", skills.normalized.join(", ")));
                }
                out
            }
            ReportBody::Match(m) => self.format_match(m),
            ReportBody::LearningPath(path) => self.format_learning_path(path),
            ReportBody::MarketSignal(signal) => self.format_signal(signal),
            ReportBody::MarketInsights(insights) => self.format_insights(insights),
            ReportBody::Ingested(processed) => self.format_ingested(processed),
        };
        output.push_str(&body);

        if self.detailed {
            output.push_str(&format!(
                "\n{}\n",
                self.colorize(
                    &format!(
                        "skill-aligner v{} | reasoning: {}",
                        report.metadata.version, report.metadata.reasoning_service
                    ),
                    Color::BrightBlack
                )
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &Report) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            90..=100 => "🟢 Excellent",
            80..=89 => "🟡 Very Good",
            70..=79 => "🟠 Good",
            60..=69 => "🔴 Fair",
            50..=59 => "🔴 Below Average",
            _ => "🔴 Poor",
        }
    }

    fn learning_path(path: &LearningPath) -> String {
        let mut output = String::from("## Learning Path\n\n");
        if path.is_empty() {
            output.push_str("No skill gaps - all requirements met.\n\n");
            return output;
        }

        output.push_str(&format!(
            "**Total time:** {} | **Total cost:** {} | **Difficulty:** {}\n\n",
            path.total_time, path.total_cost, path.difficulty
        ));
        output.push_str("| # | Skill | Current | Required | Time | Prerequisites |\n");
        output.push_str("|---|-------|---------|----------|------|---------------|\n");
        for (i, gap) in path.gaps.iter().enumerate() {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                i + 1,
                gap.skill,
                gap.current_level.map_or_else(|| "-".to_string(), |l| l.to_string()),
                gap.required_level,
                gap.time_to_acquire,
                if gap.prerequisites.is_empty() { "-".to_string() } else { gap.prerequisites.join(", ") }
            ));
        }
        output.push('\n');

        let resources: Vec<String> = path
            .gaps
            .iter()
            .flat_map(|g| g.resources.iter().map(move |r| (g, r)))
            .map(|(g, r)| format!("- **{}**: [{}]({}) ({}, {})", g.skill, r.title, r.url, r.duration, r.cost))
            .collect();
        if !resources.is_empty() {
            output.push_str("### Resources\n\n");
            output.push_str(&resources.join("\n"));
            output.push_str("\n\n");
        }
        output
    }

    fn signal_row(signal: &MarketSignal) -> String {
        format!(
            "| {} | {:.2} | {} | {} | {} |\n",
            signal.skill,
            signal.score,
            signal.trend,
            signal.job_count,
            signal.sources.join(", ")
        )
    }

    const SIGNAL_HEADER: &'static str = "| Skill | Score | Trend | Job postings | Sources |\n|-------|-------|-------|--------------|---------|\n";
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &Report) -> Result<String> {
        let mut output = format!("# 📊 {}\n\n", report.title());

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Processing Time:** {}ms | **Reasoning:** {}\n\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.processing_time_ms,
                report.metadata.reasoning_service
            ));
        }

        match &report.body {
            ReportBody::Normalized(skills) => {
                output.push_str("| Input | Normalized |\n|-------|------------|\n");
                for (raw, normalized) in skills.input.iter().zip(skills.normalized.iter()) {
                    output.push_str(&format!("| {} | {} |\n", raw, normalized));
                }
                output.push_str(&format!("\n**Normalized:** {}\n", skills.normalized.join(", ")));
            }
            ReportBody::Match(m) => {
                output.push_str("## Executive Summary\n\n");
                output.push_str(&format!(
                    "**Job:** {} (`{}`) | **Candidate:** `{}`\n\n",
                    m.job_title, m.job_id, m.candidate_id
                ));
                output.push_str(&format!(
                    "**Overall Score:** {}% {}\n\n",
                    m.percentage(),
                    Self::markdown_score_badge(m.percentage())
                ));

                output.push_str("### Score Breakdown\n\n| Component | Score |\n|-----------|-------|\n");
                let b = &m.score.breakdown;
                for (label, value) in [
                    ("Skill Match", b.skill_match),
                    ("Proficiency Match", b.proficiency_match),
                    ("Market Alignment", b.market_alignment),
                    ("Learning Potential", b.learning_potential),
                    ("Experience Match", b.experience_match),
                ] {
                    output.push_str(&format!("| {} | {}% |\n", label, percentage(value)));
                }
                output.push('\n');

                if !m.score.insights.is_empty() {
                    output.push_str("### Insights\n\n");
                    for insight in &m.score.insights {
                        output.push_str(&format!("- {}\n", insight));
                    }
                    output.push('\n');
                }
                output.push_str(&Self::learning_path(&m.score.gap_analysis));
            }
            ReportBody::LearningPath(path) => output.push_str(&Self::learning_path(path)),
            ReportBody::MarketSignal(signal) => {
                output.push_str(Self::SIGNAL_HEADER);
                output.push_str(&Self::signal_row(signal));
            }
            ReportBody::MarketInsights(insights) => {
                output.push_str("## Trends\n\n");
                output.push_str(&format!("- **Rising:** {}\n", insights.trends.rising.join(", ")));
                output.push_str(&format!("- **Stable:** {}\n", insights.trends.stable.join(", ")));
                output.push_str(&format!("- **Declining:** {}\n\n", insights.trends.declining.join(", ")));

                if !insights.emerging_skills.is_empty() {
                    output.push_str(&format!("**Emerging:** {}\n\n", insights.emerging_skills.join(", ")));
                }

                if !insights.clusters.is_empty() {
                    output.push_str("## Skill Clusters\n\n| Category | Demand | Growth | Skills |\n|----------|--------|--------|--------|\n");
                    for cluster in &insights.clusters {
                        output.push_str(&format!(
                            "| {} | {:.2} | {:+.2} | {} |\n",
                            cluster.category,
                            cluster.market_demand,
                            cluster.growth_rate,
                            cluster.skills.join(", ")
                        ));
                    }
                    output.push('\n');
                }

                output.push_str("## Recommendations\n\n");
                for (i, recommendation) in insights.recommendations.iter().enumerate() {
                    output.push_str(&format!("{}. {}\n", i + 1, recommendation));
                }
            }
            ReportBody::Ingested(processed) => {
                output.push_str(&format!(
                    "**Job:** {} (`{}`)\n\n**Skills:** {}\n\n",
                    processed.job.title,
                    processed.job.id,
                    processed.job.skill_names().join(", ")
                ));
                if !processed.market_data.is_empty() {
                    output.push_str(Self::SIGNAL_HEADER);
                    for signal in &processed.market_data {
                        output.push_str(&Self::signal_row(signal));
                    }
                }
            }
        }

        output.push_str(&format!("\n---\n*Generated by skill-aligner v{}*\n", report.metadata.version));
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &Report, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// Utility functions for saving reports
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}
