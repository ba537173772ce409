//! In-memory oracle doubles for pipeline tests.

use crate::error::AnalysisError;
use crate::oracle::Analyzer;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&str) -> Result<String, AnalysisError> + Send + Sync>;

/// Oracle that answers from a script and records every prompt.
pub struct ScriptedAnalyzer {
    replies: Mutex<VecDeque<Result<String, AnalysisError>>>,
    responder: Option<Responder>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    /// Replies are consumed in order; an exhausted script fails every call.
    pub fn new(replies: Vec<Result<String, AnalysisError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            responder: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers computed from the prompt.
    pub fn responding<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String, AnalysisError> + Send + Sync + 'static,
    {
        Self {
            replies: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(f)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Oracle that is never reachable.
    pub fn unreachable() -> Self {
        Self::responding(|_| Err(AnalysisError::Transport("connection refused".to_string())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Number of prompts containing `marker`.
    pub fn calls_containing(&self, marker: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(marker))
            .count()
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn send(
        &self,
        prompt: &str,
        _max_output_tokens: u32,
        _temperature: f32,
    ) -> Result<String, AnalysisError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(ref responder) = self.responder {
            return responder(prompt);
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::Transport("script exhausted".to_string())))
    }
}

/// A well-formed per-chunk answer.
pub fn chunk_reply(index: usize, signals: &[&str], concern: &str, summary: &str) -> String {
    serde_json::json!({
        "chunk_index": index,
        "key_signals": signals,
        "inflation_concern": concern,
        "growth_outlook": "MODERATE",
        "summary": summary,
    })
    .to_string()
}

/// A well-formed verdict answer wrapped in a code fence.
pub fn verdict_reply(stance: &str, confidence: u8) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({
            "stance": stance,
            "confidence": confidence,
            "rate_change_probability": 40,
            "direction": "NONE",
            "key_signals": ["policy rate held at 2.75%"],
            "summary": "The Bank held its policy rate.",
            "inflation_concern": "MEDIUM",
            "growth_outlook": "WEAK",
        })
    )
}
