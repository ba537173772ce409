//! Per-segment analysis (the map stage).

use crate::analysis::extract::decode;
use crate::analysis::{pace, prompts, AnalysisSettings};
use crate::models::{ChunkVerdict, Segment};
use crate::oracle::Analyzer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Issues one oracle request per segment and decodes the answer.
pub struct ChunkAnalyzer {
    analyzer: Arc<dyn Analyzer>,
    max_tokens: u32,
    temperature: f32,
    delay: Duration,
}

impl ChunkAnalyzer {
    pub fn new(analyzer: Arc<dyn Analyzer>, settings: &AnalysisSettings) -> Self {
        Self {
            analyzer,
            max_tokens: settings.chunk_max_tokens,
            temperature: settings.temperature,
            delay: settings.inter_call_delay,
        }
    }

    /// Analyze a single segment.
    ///
    /// Returns `None` when the oracle call or the decode fails. The
    /// inter-call delay is observed either way.
    pub async fn analyze_chunk(&self, segment: &Segment, source_type: &str) -> Option<ChunkVerdict> {
        let part = segment.index + 1;
        info!("Analyzing chunk {}/{}...", part, segment.total);

        let prompt = prompts::chunk_prompt(segment, source_type);
        let result = self
            .analyzer
            .send(&prompt, self.max_tokens, self.temperature)
            .await;

        pace(self.delay).await;

        match result.and_then(|response| decode::<ChunkVerdict>(&response)) {
            Ok(mut verdict) => {
                // Position comes from the segment, not from the oracle's echo
                verdict.chunk_index = segment.index;
                debug!(
                    "Chunk {}/{}: {} signals, inflation {}",
                    part,
                    segment.total,
                    verdict.key_signals.len(),
                    verdict.inflation_concern
                );
                Some(verdict)
            }
            Err(e) => {
                warn!("Error analyzing chunk {}/{}: {}", part, segment.total, e);
                None
            }
        }
    }

    /// Analyze segments one after another, keeping only successful results
    /// in segment order.
    pub async fn analyze_all(&self, segments: &[Segment], source_type: &str) -> Vec<ChunkVerdict> {
        let mut verdicts = Vec::with_capacity(segments.len());

        for segment in segments {
            if let Some(verdict) = self.analyze_chunk(segment, source_type).await {
                verdicts.push(verdict);
            }
        }

        if verdicts.len() < segments.len() {
            warn!(
                "{} of {} chunk analyses failed",
                segments.len() - verdicts.len(),
                segments.len()
            );
        }

        verdicts
    }
}
