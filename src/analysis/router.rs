//! Single entry point for document analysis.
//!
//! Routes small documents to a single oracle call and large ones through
//! the chunk → analyze → synthesize pipeline.

use crate::analysis::extract::decode_verdict;
use crate::analysis::{prompts, AnalysisSettings, ChunkAnalyzer, Chunker, Synthesizer};
use crate::error::AnalysisError;
use crate::models::Verdict;
use crate::oracle::Analyzer;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Chooses between single-shot and chunked analysis.
pub struct AnalysisRouter {
    analyzer: Arc<dyn Analyzer>,
    chunker: Chunker,
    chunk_analyzer: ChunkAnalyzer,
    synthesizer: Synthesizer,
    settings: AnalysisSettings,
}

impl AnalysisRouter {
    /// Build the pipeline. Fails only on invalid chunking settings.
    pub fn new(analyzer: Arc<dyn Analyzer>, settings: AnalysisSettings) -> Result<Self, AnalysisError> {
        let chunker = Chunker::new(settings.max_chunk_size, settings.chunk_overlap)?;

        Ok(Self {
            chunk_analyzer: ChunkAnalyzer::new(analyzer.clone(), &settings),
            synthesizer: Synthesizer::new(analyzer.clone(), &settings),
            analyzer,
            chunker,
            settings,
        })
    }

    #[cfg(test)]
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Analyze one document. Always returns exactly one verdict.
    pub async fn analyze(&self, content: &str, source_type: &str) -> Verdict {
        if self.chunker.needs_chunking(content) {
            self.analyze_chunked(content, source_type).await
        } else {
            self.analyze_single(content, source_type).await
        }
    }

    async fn analyze_chunked(&self, content: &str, source_type: &str) -> Verdict {
        info!(
            "Document length: {} chars - using chunked analysis",
            content.chars().count()
        );

        let segments = self.chunker.chunk(content);
        info!("Split into {} chunks", segments.len());

        let chunk_verdicts = self.chunk_analyzer.analyze_all(&segments, source_type).await;
        self.synthesizer.synthesize(&chunk_verdicts, source_type).await
    }

    async fn analyze_single(&self, content: &str, source_type: &str) -> Verdict {
        debug!("Single-shot analysis of {} chars", content.chars().count());

        let prompt = prompts::single_shot_prompt(content, source_type);
        let response = match self
            .analyzer
            .send(&prompt, self.settings.max_tokens, self.settings.temperature)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Error in LLM analysis: {}", e);
                return Verdict::error(source_type, e.to_string());
            }
        };

        match decode_verdict(&response) {
            Ok(mut verdict) => {
                verdict.analyzed_at = Some(Utc::now());
                verdict.source_type = source_type.to_string();
                verdict
            }
            Err(e) => {
                warn!("Error parsing LLM response: {}", e);
                debug!("Response was: {}", response);
                Verdict::unknown(source_type, e.to_string(), &response)
            }
        }
    }
}
