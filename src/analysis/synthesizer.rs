//! Combining per-chunk analyses into one verdict (the reduce stage).

use crate::analysis::extract::decode_verdict;
use crate::analysis::{prompts, AnalysisSettings};
use crate::error::AnalysisError;
use crate::models::{
    ChunkVerdict, Direction, GrowthOutlook, InflationConcern, Stance, Verdict, MAX_KEY_SIGNALS,
};
use crate::oracle::Analyzer;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Summaries taken into the fallback verdict.
const FALLBACK_SUMMARIES: usize = 2;

/// Asks the oracle for one overall judgment across all chunk analyses.
pub struct Synthesizer {
    analyzer: Arc<dyn Analyzer>,
    max_tokens: u32,
    temperature: f32,
}

impl Synthesizer {
    pub fn new(analyzer: Arc<dyn Analyzer>, settings: &AnalysisSettings) -> Self {
        Self {
            analyzer,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    /// Synthesize chunk verdicts into a final verdict.
    ///
    /// An empty input short-circuits to an ERROR verdict without calling the
    /// oracle. A failed synthesis pass falls back to [`fallback_verdict`].
    pub async fn synthesize(&self, chunks: &[ChunkVerdict], source_type: &str) -> Verdict {
        if chunks.is_empty() {
            return Verdict::error(source_type, AnalysisError::EmptyInput.to_string());
        }

        info!("Synthesizing {} chunk analyses...", chunks.len());

        match self.request(chunks, source_type).await {
            Ok(mut verdict) => {
                verdict.analyzed_at = Some(Utc::now());
                verdict.source_type = source_type.to_string();
                verdict.chunks_analyzed = Some(chunks.len());
                verdict
            }
            Err(e) => {
                warn!("Error in synthesis, using fallback: {}", e);
                fallback_verdict(chunks, source_type, &e.to_string())
            }
        }
    }

    async fn request(
        &self,
        chunks: &[ChunkVerdict],
        source_type: &str,
    ) -> Result<Verdict, AnalysisError> {
        let prompt = prompts::synthesis_prompt(chunks, source_type);
        let response = self
            .analyzer
            .send(&prompt, self.max_tokens, self.temperature)
            .await?;
        decode_verdict(&response)
    }
}

/// Deterministic verdict built from chunk analyses alone.
///
/// Performs no I/O: signals are the first five across all chunks in order,
/// the summary joins the first two non-empty chunk summaries, and concern
/// and outlook come from the first chunk.
pub fn fallback_verdict(chunks: &[ChunkVerdict], source_type: &str, reason: &str) -> Verdict {
    let key_signals: Vec<String> = chunks
        .iter()
        .flat_map(|c| c.key_signals.iter().cloned())
        .take(MAX_KEY_SIGNALS)
        .collect();

    let summary = chunks
        .iter()
        .map(|c| c.summary.as_str())
        .filter(|s| !s.is_empty())
        .take(FALLBACK_SUMMARIES)
        .collect::<Vec<_>>()
        .join(" ");

    let first = chunks.first();

    Verdict {
        stance: Stance::Neutral,
        confidence: 50,
        rate_change_probability: 25,
        direction: Direction::None,
        key_signals,
        summary,
        inflation_concern: first
            .map(|c| c.inflation_concern)
            .unwrap_or(InflationConcern::Unclear),
        growth_outlook: first
            .map(|c| c.growth_outlook)
            .unwrap_or(GrowthOutlook::Unclear),
        source_type: source_type.to_string(),
        analyzed_at: Some(Utc::now()),
        chunks_analyzed: Some(chunks.len()),
        title: None,
        error: None,
        raw_response: None,
        synthesis_error: Some(reason.to_string()),
    }
}
