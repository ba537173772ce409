//! Markdown and JSON report generation.
//!
//! This module renders the verdicts of one run, together with their
//! aggregate summary, as a Markdown policy report and a JSON document,
//! and writes both to the output directory.

use crate::analysis::{all_signals, PolicySummary};
use crate::models::{Stance, Verdict};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Signals listed per source in the Markdown report.
const SIGNALS_PER_SOURCE: usize = 3;

/// Timestamp format used in report file names.
const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyReport {
    pub timestamp: String,
    pub summary: Option<PolicySummary>,
    pub analyses: Vec<Verdict>,
    #[serde(skip)]
    pub generated_at: DateTime<Utc>,
    #[serde(skip)]
    pub model: String,
}

impl PolicyReport {
    pub fn new(analyses: Vec<Verdict>, model: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: generated_at.format(FILE_TIMESTAMP).to_string(),
            summary: PolicySummary::from_verdicts(&analyses),
            analyses,
            generated_at,
            model: model.to_string(),
        }
    }
}

/// Paths of the files written by [`save_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReports {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &PolicyReport) -> String {
    let mut output = String::new();

    output.push_str("# Bank of Canada Policy Analysis\n\n");
    output.push_str(&format!(
        "*Generated {} with `{}`*\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.model
    ));

    let Some(summary) = &report.summary else {
        output.push_str("No analyses available.\n\n");
        output.push_str(&generate_footer());
        return output;
    };

    output.push_str(&generate_summary_section(summary));
    output.push_str(&generate_sources_section(&report.analyses));
    output.push_str(&generate_insights_section(summary, &report.analyses));
    output.push_str(&generate_footer());

    output
}

/// Generate the aggregate section.
fn generate_summary_section(summary: &PolicySummary) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Aggregate Analysis\n\n*Based on {} source(s)*\n\n",
        summary.sources
    ));
    section.push_str(&format!(
        "- **Average Confidence:** {:.1}%\n",
        summary.average_confidence
    ));
    section.push_str(&format!(
        "- **Average Rate Change Probability (3 months):** {:.1}%\n",
        summary.average_rate_change_probability
    ));
    section.push_str(&format!(
        "- **Overall Assessment:** {}\n\n",
        summary.bias.description()
    ));

    let counts = &summary.stance_counts;
    section.push_str("### Stance Distribution\n\n");
    section.push_str("| Stance | Meaning | Sources |\n");
    section.push_str("|:---|:---|:---:|\n");
    for (stance, meaning, count) in [
        (Stance::Hawkish, "Rate increases likely", counts.hawkish),
        (Stance::Dovish, "Rate cuts likely", counts.dovish),
        (Stance::Neutral, "No clear direction", counts.neutral),
        (Stance::Hold, "Maintaining current rate", counts.hold),
    ] {
        section.push_str(&format!(
            "| {} {} | {} | {} |\n",
            stance.emoji(),
            stance,
            meaning,
            count
        ));
    }
    if counts.degraded() > 0 {
        section.push_str(&format!(
            "| {} {} / {} {} | Analysis failed | {} |\n",
            Stance::Unknown.emoji(),
            Stance::Unknown,
            Stance::Error.emoji(),
            Stance::Error,
            counts.degraded()
        ));
    }
    section.push('\n');

    section
}

/// Generate one subsection per analyzed source.
fn generate_sources_section(verdicts: &[Verdict]) -> String {
    let mut section = String::new();

    section.push_str("## Individual Source Analyses\n\n");
    for (i, verdict) in verdicts.iter().enumerate() {
        section.push_str(&generate_source_block(i + 1, verdict));
    }

    section
}

fn generate_source_block(number: usize, verdict: &Verdict) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {}. {} {}\n\n",
        number,
        verdict.stance.emoji(),
        verdict.source_type
    ));

    if let Some(ref title) = verdict.title {
        block.push_str(&format!("*{}*\n\n", title));
    }

    block.push_str(&format!("- **Stance:** {}\n", verdict.stance));
    block.push_str(&format!("- **Confidence:** {}%\n", verdict.confidence));
    block.push_str(&format!(
        "- **Rate Change Probability:** {}%\n",
        verdict.rate_change_probability
    ));
    block.push_str(&format!("- **Direction:** {}\n", verdict.direction));
    block.push_str(&format!(
        "- **Inflation Concern:** {}\n",
        verdict.inflation_concern
    ));
    block.push_str(&format!("- **Growth Outlook:** {}\n", verdict.growth_outlook));
    if let Some(chunks) = verdict.chunks_analyzed {
        block.push_str(&format!("- **Chunks Analyzed:** {}\n", chunks));
    }
    block.push('\n');

    if !verdict.summary.is_empty() {
        block.push_str(&format!("**Summary:** {}\n\n", verdict.summary));
    }

    if !verdict.key_signals.is_empty() {
        block.push_str("**Key Signals:**\n\n");
        for signal in verdict.key_signals.iter().take(SIGNALS_PER_SOURCE) {
            block.push_str(&format!("- {}\n", signal));
        }
        block.push('\n');
    }

    if let Some(ref error) = verdict.error {
        block.push_str(&format!("> ❌ **Error:** {}\n\n", error));
    }
    if let Some(ref error) = verdict.synthesis_error {
        block.push_str(&format!(
            "> ⚠️ Synthesis failed, combined from chunk analyses: {}\n\n",
            error
        ));
    }

    block
}

/// Generate the actionable insights section.
fn generate_insights_section(summary: &PolicySummary, verdicts: &[Verdict]) -> String {
    let mut section = String::new();

    section.push_str("## Actionable Insights\n\n");
    section.push_str(&format!("**{}**\n\n", summary.outlook.headline()));
    for line in summary.outlook.guidance() {
        section.push_str(&format!("- {}\n", line));
    }
    section.push('\n');

    let signals = all_signals(verdicts);
    if !signals.is_empty() {
        section.push_str(&format!("*{} key signal(s) identified across all sources.*\n\n", signals.len()));
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by bocwatch. Not financial advice.*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &PolicyReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write both reports to `output_dir`, creating it if needed.
pub fn save_reports(report: &PolicyReport, output_dir: &Path) -> Result<SavedReports> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    let stem = format!("boc_analysis_{}", report.timestamp);
    let saved = SavedReports {
        markdown: output_dir.join(format!("{}.md", stem)),
        json: output_dir.join(format!("{}.json", stem)),
    };

    write_file(&saved.markdown, &generate_markdown_report(report))?;
    write_file(&saved.json, &generate_json_report(report)?)?;

    Ok(saved)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
