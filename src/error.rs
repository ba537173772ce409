//! Error types for the analysis core.

/// Failures raised inside the analysis pipeline and its collaborators.
///
/// None of these escape the pipeline: each one is absorbed at the smallest
/// scope and turned into a degraded verdict.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Oracle or fetch unreachable, timed out, or answered with a failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Oracle answer was not valid structured data.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// No chunk analysis survived to the synthesis stage.
    #[error("All chunk analyses failed")]
    EmptyInput,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::Transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            AnalysisError::Transport(format!("connection failed: {}", e))
        } else {
            AnalysisError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AnalysisError::EmptyInput.to_string(),
            "All chunk analyses failed"
        );
        assert!(AnalysisError::Decode("eof".to_string())
            .to_string()
            .starts_with("Failed to parse response"));
    }

    #[test]
    fn test_from_json_error_is_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(AnalysisError::from(err), AnalysisError::Decode(_)));
    }
}
