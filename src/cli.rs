//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Settings left unset here fall back to the
//! configuration file, then to built-in defaults.

use crate::config::Provider;
use clap::Parser;
use std::path::PathBuf;

/// bocwatch - Bank of Canada monetary policy monitor
///
/// Fetches policy announcements, press releases and the Monetary Policy
/// Report, asks an LLM to judge the policy stance of each, and writes a
/// Markdown/JSON report. Long documents are analyzed in chunks and
/// synthesized into one verdict.
///
/// Examples:
///   bocwatch
///   bocwatch --include-speeches --format json
///   bocwatch --provider ollama --model llama3.2:latest
///   bocwatch --file mpr.txt --source-type "Monetary Policy Report"
///   bocwatch --dry-run
///   bocwatch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .bocwatch.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .bocwatch.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Directory the reports are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report format printed to stdout (markdown, json)
    ///
    /// Both formats are always saved to the output directory.
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Model to use for analysis
    #[arg(short, long, env = "BOCWATCH_MODEL")]
    pub model: Option<String>,

    /// LLM provider (anthropic, ollama)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Provider API endpoint URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds for each LLM call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Largest chunk, in characters, sent in one request
    #[arg(long, value_name = "CHARS")]
    pub max_chunk_size: Option<usize>,

    /// Characters carried over between consecutive chunks
    #[arg(long, value_name = "CHARS")]
    pub chunk_overlap: Option<usize>,

    /// Pause in seconds after each LLM call
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Analyze this page instead of the standard sources (repeatable)
    #[arg(long, value_name = "URL")]
    pub url: Vec<String>,

    /// Analyze this local text file instead of the standard sources (repeatable)
    #[arg(long, value_name = "PATH")]
    pub file: Vec<PathBuf>,

    /// Source type label for --url and --file inputs
    #[arg(long, default_value = "Document", value_name = "LABEL")]
    pub source_type: String,

    /// Also analyze recent speeches
    #[arg(long)]
    pub include_speeches: bool,

    /// Dry run: fetch and chunk documents without calling the LLM
    ///
    /// Shows how each document would be split and exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether ad-hoc inputs replace the standard sources.
    pub fn has_custom_inputs(&self) -> bool {
        !self.url.is_empty() || !self.file.is_empty()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate temperature range
        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(delay) = self.delay {
            if !delay.is_finite() || delay < 0.0 {
                return Err("Delay must be a non-negative number of seconds".to_string());
            }
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        for url in &self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("Document URL must start with 'http://' or 'https://': {}", url));
            }
        }

        for path in &self.file {
            if !path.is_file() {
                return Err(format!("Document file does not exist: {}", path.display()));
            }
        }

        if self.source_type.trim().is_empty() {
            return Err("Source type must not be empty".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over `verbose = true` in the configuration file.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            init_config: false,
            output_dir: None,
            format: OutputFormat::Markdown,
            model: None,
            provider: None,
            api_url: None,
            temperature: None,
            timeout: None,
            max_chunk_size: None,
            chunk_overlap: None,
            delay: None,
            url: Vec::new(),
            file: Vec::new(),
            source_type: "Document".to_string(),
            include_speeches: false,
            dry_run: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_default_args_are_valid() {
        assert!(make_args().validate().is_ok());
        assert!(!make_args().has_custom_inputs());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "bocwatch",
            "--provider",
            "ollama",
            "--url",
            "https://example.com/a",
            "--url",
            "https://example.com/b",
            "--delay",
            "0.5",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.provider, Some(Provider::Ollama));
        assert_eq!(args.url.len(), 2);
        assert_eq!(args.delay, Some(0.5));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.has_custom_inputs());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.delay = Some(-1.0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_inputs() {
        let mut args = make_args();
        args.url = vec!["ftp://example.com".to_string()];
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.file = vec![PathBuf::from("/nonexistent/policy.txt")];
        assert!(args.validate().is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args();
        args.file = vec![file.path().to_path_buf()];
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_args_override_config() {
        let mut args = make_args();
        args.model = Some("llama3.2:latest".to_string());
        args.provider = Some(Provider::Ollama);
        args.max_chunk_size = Some(8_000);
        args.delay = Some(0.0);
        args.output_dir = Some(PathBuf::from("reports"));

        let mut config = crate::config::Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.chunking.max_chunk_size, 8_000);
        assert_eq!(config.chunking.chunk_overlap, 1_000);
        assert!(config.chunking.delay().is_zero());
        assert_eq!(config.general.output_dir, PathBuf::from("reports"));
        assert_eq!(config.model.temperature, 0.3);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_honors_config_verbose() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
