//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.bocwatch.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".bocwatch.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Oracle model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Chunking and pacing settings.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Source fetching settings.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory receiving the report files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Which oracle API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// Local Ollama chat API
    Ollama,
}

/// Oracle model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API flavour.
    #[serde(default)]
    pub provider: Provider,

    /// Model identifier, passed through unmodified.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the API. Defaults depend on the provider.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Transport timeout per call in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Response budget for single-shot and synthesis calls.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Response budget for per-chunk calls.
    #[serde(default = "default_chunk_max_tokens")]
    pub chunk_max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model(),
            api_url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            max_tokens: default_max_tokens(),
            chunk_max_tokens: default_chunk_max_tokens(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_chunk_max_tokens() -> u32 {
    1000
}

impl ModelConfig {
    /// Effective API base URL for the configured provider.
    pub fn effective_api_url(&self) -> String {
        match (&self.api_url, self.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Provider::Anthropic) => "https://api.anthropic.com".to_string(),
            (None, Provider::Ollama) => "http://localhost:11434".to_string(),
        }
    }

    /// Transport timeout per call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Chunking and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Documents longer than this many characters take the chunked path.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Sleep between oracle calls in seconds.
    #[serde(default = "default_delay")]
    pub inter_call_delay_seconds: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            inter_call_delay_seconds: default_delay(),
        }
    }
}

fn default_max_chunk_size() -> usize {
    50_000 // ~12.5K tokens
}

fn default_chunk_overlap() -> usize {
    1_000
}

fn default_delay() -> f64 {
    1.0
}

impl ChunkingConfig {
    /// Inter-call delay as a duration.
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.inter_call_delay_seconds.max(0.0))
    }
}

/// Source fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Central bank website root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: u64,

    /// Press release links collected from the news page.
    #[serde(default = "default_max_press_releases")]
    pub max_press_releases: usize,

    /// Press releases actually analyzed.
    #[serde(default = "default_analyze_press_releases")]
    pub analyze_press_releases: usize,

    /// Speech links collected from the speeches page.
    #[serde(default = "default_max_speeches")]
    pub max_speeches: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_fetch_timeout(),
            max_press_releases: default_max_press_releases(),
            analyze_press_releases: default_analyze_press_releases(),
            max_speeches: default_max_speeches(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.bankofcanada.ca".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_press_releases() -> usize {
    5
}

fn default_analyze_press_releases() -> usize {
    2
}

fn default_max_speeches() -> usize {
    3
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunking.max_chunk_size == 0 {
            return Err("max_chunk_size must be at least 1".to_string());
        }

        // The force-split step is max_chunk_size - chunk_overlap and must stay positive
        if self.chunking.chunk_overlap >= self.chunking.max_chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be smaller than max_chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.max_chunk_size
            ));
        }

        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err("Temperature must be between 0.0 and 1.0".to_string());
        }

        if self.model.timeout_seconds == 0 || self.sources.timeout_seconds == 0 {
            return Err("Timeouts must be at least 1 second".to_string());
        }

        if !self.chunking.inter_call_delay_seconds.is_finite()
            || self.chunking.inter_call_delay_seconds < 0.0
        {
            return Err("inter_call_delay_seconds must be a non-negative number".to_string());
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref api_url) = args.api_url {
            self.model.api_url = Some(api_url.clone());
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(size) = args.max_chunk_size {
            self.chunking.max_chunk_size = size;
        }
        if let Some(overlap) = args.chunk_overlap {
            self.chunking.chunk_overlap = overlap;
        }
        if let Some(delay) = args.delay {
            self.chunking.inter_call_delay_seconds = delay;
        }

        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "claude-sonnet-4-20250514");
        assert_eq!(config.model.provider, Provider::Anthropic);
        assert_eq!(config.chunking.max_chunk_size, 50_000);
        assert_eq!(config.chunking.chunk_overlap, 1_000);
        assert_eq!(config.chunking.delay(), Duration::from_secs(1));
        assert_eq!(config.general.output_dir, PathBuf::from("output"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "reports"
verbose = true

[model]
provider = "ollama"
name = "llama3.2:latest"
temperature = 0.2

[chunking]
max_chunk_size = 8000
chunk_overlap = 200
inter_call_delay_seconds = 0.5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, PathBuf::from("reports"));
        assert!(config.general.verbose);
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.effective_api_url(), "http://localhost:11434");
        assert_eq!(config.chunking.max_chunk_size, 8000);
        assert_eq!(config.chunking.delay(), Duration::from_millis(500));
        assert_eq!(config.sources.max_speeches, 3);
    }

    #[test]
    fn test_validate_rejects_overlap_not_below_size() {
        let mut config = Config::default();
        config.chunking.max_chunk_size = 1000;
        config.chunking.chunk_overlap = 1000;
        assert!(config.validate().is_err());

        config.chunking.chunk_overlap = 999;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.model.temperature = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_url_override_trims_slash() {
        let mut config = Config::default();
        assert_eq!(config.model.effective_api_url(), "https://api.anthropic.com");

        config.model.api_url = Some("http://proxy.local/".to_string());
        assert_eq!(config.model.effective_api_url(), "http://proxy.local");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[chunking]\nmax_chunk_size = 1234\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.chunking.max_chunk_size, 1234);
        assert_eq!(config.chunking.chunk_overlap, 1_000);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[chunking]"));
        assert!(toml_str.contains("[sources]"));
    }
}
