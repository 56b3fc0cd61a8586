//! Lead-Ripple main entry point
//!
//! This is the command-line interface for the Lead-Ripple lead crawler.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use lead_ripple::config::{load_config_with_hash, validate, Config, ExportFormat};
use lead_ripple::crawler::Session;
use lead_ripple::leads::{ContentClassifier, LlmClassifier, OfflineClassifier};
use lead_ripple::output::{export_leads, print_statistics};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Lead-Ripple: a depth-bounded lead crawler
///
/// Lead-Ripple starts from business websites, follows the links most likely
/// to lead to contact details (about, team, contact pages), and exports the
/// deduplicated leads it finds.
#[derive(Parser, Debug)]
#[command(name = "lead-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A depth-bounded lead crawler", long_about = None)]
struct Cli {
    /// Seed URLs to start from
    #[arg(value_name = "URL")]
    seeds: Vec<String>,

    /// Path to TOML configuration file; built-in defaults apply when omitted
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// File with one seed URL per line (blank lines and # comments ignored)
    #[arg(long, value_name = "FILE")]
    seeds_file: Option<PathBuf>,

    /// Override the configured maximum depth (0-3)
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Business keyword passed to the classifier
    #[arg(short, long)]
    keyword: Option<String>,

    /// Override the configured export format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Override the configured output directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Use offline regex extraction even if an API key is set
    #[arg(long)]
    offline: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Sqlite,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Sqlite => ExportFormat::Sqlite,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let seeds = collect_seeds(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &seeds);
        return Ok(());
    }

    if seeds.is_empty() {
        bail!("no seed URLs given; pass them as arguments or with --seeds-file");
    }

    handle_crawl(config, seeds, cli.offline, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lead_ripple=info,warn"),
            1 => EnvFilter::new("lead_ripple=debug,info"),
            2 => EnvFilter::new("lead_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(depth) = cli.max_depth {
        config.crawler.max_depth = depth;
    }
    if let Some(keyword) = &cli.keyword {
        config.classifier.keyword = keyword.clone();
    }
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

fn collect_seeds(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let mut seeds = cli.seeds.clone();

    if let Some(path) = &cli.seeds_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seeds file {}", path.display()))?;
        seeds.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    Ok(seeds)
}

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== Lead-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Link policy: {:?}", config.crawler.link_policy);
    println!(
        "  Max child links per page: {}",
        config.crawler.max_child_links_per_page
    );
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Delay after each page: {}-{}ms",
        config.fetch.delay_min_ms, config.fetch.delay_max_ms
    );

    println!("\nClassifier:");
    println!("  Endpoint: {}", config.classifier.endpoint);
    println!("  Model: {}", config.classifier.model);
    let key_state = if std::env::var(&config.classifier.api_key_env).is_ok() {
        "set"
    } else {
        "not set, offline extraction"
    };
    println!("  {}: {}", config.classifier.api_key_env, key_state);
    if !config.classifier.keyword.is_empty() {
        println!("  Keyword: {}", config.classifier.keyword);
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Format: {:?}", config.output.format);

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

fn build_classifier(config: &Config, offline: bool) -> anyhow::Result<Arc<dyn ContentClassifier>> {
    if offline {
        return Ok(Arc::new(OfflineClassifier::new()));
    }

    match LlmClassifier::from_env(&config.classifier) {
        Some(classifier) => {
            let classifier = classifier.context("failed to set up the classifier")?;
            tracing::info!("Using classifier model {}", config.classifier.model);
            Ok(Arc::new(classifier))
        }
        None => {
            tracing::info!(
                "{} is not set; using offline extraction",
                config.classifier.api_key_env
            );
            Ok(Arc::new(OfflineClassifier::new()))
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    seeds: Vec<String>,
    offline: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let classifier = build_classifier(&config, offline)?;
    let max_depth = config.crawler.max_depth;
    let format = config.output.format;
    let output_dir = PathBuf::from(&config.output.directory);

    let session = Session::with_http_driver(config, classifier)?;

    let abort = session.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; letting in-flight pages finish");
            abort.abort();
        }
    });

    let result = session.run(&seeds, max_depth).await;
    session.close().await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let path = export_leads(&report.leads, format, Path::new(&output_dir))?;

    if !quiet {
        println!();
        print_statistics(&report.stats);
        println!("\n✓ {} lead(s) written to {}", report.leads.len(), path.display());
    }

    Ok(())
}
