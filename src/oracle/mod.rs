//! Text-analysis oracle.
//!
//! The oracle is an external, fallible service: given a prompt it returns a
//! response string. The pipeline only ever talks to it through the
//! [`Analyzer`] trait so tests can substitute a scripted implementation.

pub mod client;

use crate::error::AnalysisError;
use async_trait::async_trait;

pub use client::build_analyzer;

/// Capability interface for the text-analysis oracle.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Send one prompt and return the raw response text.
    ///
    /// Network, authentication and quota problems surface as
    /// [`AnalysisError::Transport`].
    async fn send(
        &self,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, AnalysisError>;
}
