//! HTTP oracle clients.
//!
//! Two API flavours are supported:
//! - Anthropic Messages API (default)
//! - Ollama chat API (local models)

use crate::config::{ModelConfig, Provider};
use crate::error::AnalysisError;
use crate::oracle::Analyzer;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Chat message shared by both request formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Anthropic Messages API request.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

/// Anthropic Messages API response.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// Concatenated text of all text blocks.
    fn text(self) -> Result<String, AnalysisError> {
        let text: String = self
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect();

        if text.is_empty() {
            return Err(AnalysisError::Transport(
                "Response contained no text content".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, AnalysisError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AnalysisError::Transport(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success status into a transport error carrying the body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AnalysisError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AnalysisError::Transport(format!("API error {}: {}", status, body)))
}

/// Client for the Anthropic Messages API.
pub struct AnthropicAnalyzer {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl AnthropicAnalyzer {
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            http_client: http_client(timeout)?,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Analyzer for AnthropicAnalyzer {
    async fn send(
        &self,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}/v1/messages", self.api_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: max_output_tokens,
            temperature,
            messages: vec![ChatMessage::user(prompt)],
        };

        debug!("Sending {} char prompt to {}", prompt.len(), url);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let body: MessagesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AnalysisError::Transport(format!("Malformed API response: {}", e)))?;

        body.text()
    }
}

/// Client for a local Ollama server.
pub struct OllamaAnalyzer {
    http_client: reqwest::Client,
    api_url: String,
    model: String,
}

impl OllamaAnalyzer {
    pub fn new(api_url: String, model: String, timeout: Duration) -> Result<Self, AnalysisError> {
        Ok(Self {
            http_client: http_client(timeout)?,
            api_url,
            model,
        })
    }
}

#[async_trait]
impl Analyzer for OllamaAnalyzer {
    async fn send(
        &self,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}/api/chat", self.api_url);
        let request = OllamaChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: max_output_tokens,
            },
        };

        debug!("Sending {} char prompt to {}", prompt.len(), url);

        let response = self.http_client.post(&url).json(&request).send().await?;

        let body: OllamaChatResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AnalysisError::Transport(format!("Malformed Ollama response: {}", e)))?;

        Ok(body.message.content)
    }
}

/// Build the oracle client selected by the model configuration.
pub fn build_analyzer(config: &ModelConfig) -> Result<Arc<dyn Analyzer>> {
    let api_url = config.effective_api_url();
    info!(
        "Using {:?} oracle with model {} at {}",
        config.provider, config.name, api_url
    );

    match config.provider {
        Provider::Anthropic => {
            let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
            if api_key.trim().is_empty() || api_key == "your-api-key-here" {
                bail!(
                    "{} environment variable not set. Export a valid API key first.",
                    config.api_key_env
                );
            }
            let client = AnthropicAnalyzer::new(
                api_url,
                api_key,
                config.name.clone(),
                config.timeout(),
            )
            .context("Failed to initialize Anthropic client")?;
            Ok(Arc::new(client))
        }
        Provider::Ollama => {
            let client = OllamaAnalyzer::new(api_url, config.name.clone(), config.timeout())
                .context("Failed to initialize Ollama client")?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_request_shape() {
        let request = MessagesRequest {
            model: "claude-test",
            max_tokens: 1000,
            temperature: 0.3,
            messages: vec![ChatMessage::user("hello")],
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_messages_response_text() {
        let body = r#"{"content": [
            {"type": "text", "text": "{\"stance\":"},
            {"type": "tool_use", "id": "x"},
            {"type": "text", "text": " \"HOLD\"}"}
        ]}"#;
        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().unwrap(), "{\"stance\": \"HOLD\"}");
    }

    #[test]
    fn test_messages_response_without_text_is_transport_error() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(response.text(), Err(AnalysisError::Transport(_))));
    }

    #[test]
    fn test_ollama_request_shape() {
        let request = OllamaChatRequest {
            model: "llama3.2:latest",
            messages: vec![ChatMessage::user("hi")],
            stream: false,
            options: OllamaOptions {
                temperature: 0.1,
                num_predict: 1500,
            },
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1500);
    }

    #[test]
    fn test_build_analyzer_requires_api_key() {
        let config = ModelConfig {
            api_key_env: "BOCWATCH_TEST_MISSING_KEY".to_string(),
            ..ModelConfig::default()
        };
        let err = build_analyzer(&config).err().unwrap();
        assert!(err.to_string().contains("BOCWATCH_TEST_MISSING_KEY"));
    }

    #[test]
    fn test_build_analyzer_ollama_needs_no_key() {
        let config = ModelConfig {
            provider: Provider::Ollama,
            api_key_env: "BOCWATCH_TEST_UNUSED_KEY".to_string(),
            ..ModelConfig::default()
        };
        assert!(build_analyzer(&config).is_ok());
    }
}
