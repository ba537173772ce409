//! bocwatch - Bank of Canada monetary policy monitor
//!
//! A CLI tool that fetches central bank publications, asks an LLM to
//! judge the monetary-policy stance of each, and writes an aggregate
//! Markdown/JSON report. Documents too long for one request are split
//! into overlapping chunks, analyzed piecewise and synthesized.
//!
//! Exit codes:
//!   0 - Success (including runs where individual analyses degraded)
//!   1 - Runtime error (configuration, missing API key, unwritable output)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod oracle;
mod report;
mod source;

use analysis::{AnalysisRouter, AnalysisSettings, Chunker};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use error::AnalysisError;
use indicatif::{ProgressBar, ProgressStyle};
use models::Verdict;
use report::PolicyReport;
use source::{BankSite, Document, HttpSourceFetcher, SourceFetcher};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration; its verbosity setting feeds the log level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("bocwatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration from {}", config_source);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_monitor(args, config).await {
        error!("Analysis run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .bocwatch.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to customize provider, model, chunking, and sources.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over the configured level when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete monitoring workflow.
async fn run_monitor(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    config.validate().map_err(AnalysisError::Config)?;

    // Step 1: Gather documents
    let fetcher: Arc<dyn SourceFetcher> = Arc::new(HttpSourceFetcher::new(Duration::from_secs(
        config.sources.timeout_seconds,
    ))?);
    let documents = collect_documents(&args, &config, fetcher).await?;

    if documents.is_empty() {
        warn!("No documents could be retrieved");
    }

    // Handle --dry-run: show the chunk plan and exit
    if args.dry_run {
        return handle_dry_run(&documents, &config);
    }

    // Step 2: Initialize the oracle
    if !args.quiet {
        println!("🤖 Initializing LLM analysis...");
        println!("   Provider: {:?}", config.model.provider);
        println!("   Model: {}", config.model.name);
        println!("   Timeout: {}s", config.model.timeout_seconds);
    }

    let analyzer = oracle::build_analyzer(&config.model)?;
    let router = AnalysisRouter::new(analyzer, AnalysisSettings::from_config(&config))?;

    // Step 3: Analyze every document
    let verdicts = analyze_documents(&router, &documents, config.chunking.delay(), args.quiet).await;

    // Step 4: Build and save the reports
    let report = PolicyReport::new(verdicts, &config.model.name, Utc::now());
    let saved = report::save_reports(&report, &config.general.output_dir)?;
    info!("Reports saved to {}", config.general.output_dir.display());

    if !args.quiet {
        let output = match args.format {
            OutputFormat::Json => report::generate_json_report(&report)?,
            OutputFormat::Markdown => report::generate_markdown_report(&report),
        };
        println!("\n{}", output);

        println!("💾 Report saved to: {}", saved.markdown.display());
        println!("💾 Raw data saved to: {}", saved.json.display());
        println!(
            "\n✅ Analysis complete! {} source(s) in {:.1}s",
            report.analyses.len(),
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Gather the documents to analyze: ad-hoc inputs when given, the
/// standard central bank sources otherwise.
async fn collect_documents(
    args: &Args,
    config: &Config,
    fetcher: Arc<dyn SourceFetcher>,
) -> Result<Vec<Document>> {
    let site = BankSite::new(fetcher, config.sources.clone());

    if !args.has_custom_inputs() {
        if !args.quiet {
            println!("🔍 Fetching Bank of Canada publications...");
        }
        return Ok(site.collect(args.include_speeches).await);
    }

    let mut documents = Vec::new();

    for path in &args.file {
        documents.push(Document::from_file(path, &args.source_type)?);
    }

    for url in &args.url {
        match site.fetch_url(url, &args.source_type).await {
            Some(document) => documents.push(document),
            None => warn!("Skipping {}: could not be fetched", url),
        }
    }

    documents.retain(|d| {
        if d.is_blank() {
            warn!("Skipping {}: no text content", d.location);
        }
        !d.is_blank()
    });

    Ok(documents)
}

/// Analyze documents in order, pausing between them.
async fn analyze_documents(
    router: &AnalysisRouter,
    documents: &[Document],
    delay: Duration,
    quiet: bool,
) -> Vec<Verdict> {
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(documents.len() as u64)
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress.set_style(style.progress_chars("#>-"));
    }

    let mut verdicts = Vec::with_capacity(documents.len());

    for (i, document) in documents.iter().enumerate() {
        progress.set_message(document.source_type.clone());
        info!(
            "Analyzing {} ({} chars): {}",
            document.source_type,
            document.content.chars().count(),
            document.location
        );

        let verdict = router
            .analyze(&document.content, &document.source_type)
            .await
            .with_title(document.title.clone());

        if verdict.stance.is_degraded() {
            warn!(
                "{} analysis degraded to {}: {}",
                document.source_type,
                verdict.stance,
                verdict.error.as_deref().unwrap_or("no detail")
            );
        }

        verdicts.push(verdict);
        progress.inc(1);

        if i + 1 < documents.len() {
            analysis::pace(delay).await;
        }
    }

    progress.finish_and_clear();
    verdicts
}

/// Handle --dry-run: print how each document would be chunked.
fn handle_dry_run(documents: &[Document], config: &Config) -> Result<()> {
    let chunker = Chunker::new(config.chunking.max_chunk_size, config.chunking.chunk_overlap)?;

    println!(
        "\n🔍 Dry run: chunk plan, max {} chars, overlap {} (no LLM calls)...\n",
        chunker.max_size(),
        chunker.overlap()
    );

    if documents.is_empty() {
        println!("   No documents retrieved.");
    }

    for document in documents {
        let segments = chunker.chunk(&document.content);
        let mode = if chunker.needs_chunking(&document.content) {
            "chunked"
        } else {
            "single request"
        };

        println!(
            "   📄 {} ({} chars, {}): {}",
            document.source_type,
            document.content.chars().count(),
            mode,
            document.location
        );
        if let Some(ref title) = document.title {
            println!("      {}", title);
        }
        for segment in &segments {
            println!(
                "      • part {}/{}: {} chars",
                segment.index + 1,
                segment.total,
                segment.text.chars().count()
            );
        }
    }

    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so it reports where the settings came
/// from instead of logging it.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, config::CONFIG_FILE.to_string())),
        Ok(None) => Ok((Config::default(), "built-in defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), "built-in defaults".to_string()))
        }
    }
}
