//! Analysis pipeline.
//!
//! Small documents are judged in one oracle call. Large ones go through
//! chunk → per-chunk analysis → synthesis, and every failure along the way
//! degrades to a well-formed verdict instead of an error.

pub mod aggregator;
pub mod chunk_analyzer;
pub mod chunker;
pub mod extract;
pub mod prompts;
pub mod router;
pub mod synthesizer;

#[cfg(test)]
pub mod testing;

pub use aggregator::*;
pub use chunk_analyzer::ChunkAnalyzer;
pub use chunker::Chunker;
pub use router::AnalysisRouter;
pub use synthesizer::Synthesizer;

use crate::config::Config;
use std::time::Duration;

/// Immutable pipeline settings shared by every stage.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub max_chunk_size: usize,
    pub chunk_overlap: usize,
    /// Sleep observed after every per-chunk oracle call.
    pub inter_call_delay: Duration,
    pub temperature: f32,
    /// Response budget for single-shot and synthesis calls.
    pub max_tokens: u32,
    /// Response budget for per-chunk calls.
    pub chunk_max_tokens: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AnalysisSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_chunk_size: config.chunking.max_chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            inter_call_delay: config.chunking.delay(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            chunk_max_tokens: config.model.chunk_max_tokens,
        }
    }
}

/// Rate-limit courtesy pause between oracle calls.
pub(crate) async fn pace(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
