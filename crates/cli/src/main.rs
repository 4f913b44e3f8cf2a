//! cuppy entry point.
//!
//! Reads a file of URLs (one per line), runs each through the fetch
//! pipeline, and prints one JSON report per URL to stdout. Logging goes to
//! stderr so stdout stays machine-readable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cuppy_client::fetch::{FetchConfig, ReqwestFetcher};
use cuppy_client::{FetchPipeline, PipelineOptions};
use cuppy_core::{AppConfig, Store};
use tracing_subscriber::EnvFilter;

/// Compliance-aware page fetcher with a persistent conditional-fetch cache.
#[derive(Parser, Debug)]
#[command(name = "cuppy", version, about)]
struct Cli {
    /// File containing URLs to fetch, one per line.
    url_file: PathBuf,

    /// Check robots.txt before fetching; disallowed URLs are skipped.
    #[arg(short = 'r', long = "robotstxt")]
    robotstxt: bool,

    /// Refetch every URL even when a cached entity tag is available.
    #[arg(short = 'f', long = "force")]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().context("failed to load configuration")?;

    let contents = std::fs::read_to_string(&cli.url_file)
        .with_context(|| format!("failed to read {}", cli.url_file.display()))?;
    let urls: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        tracing::warn!(file = %cli.url_file.display(), "no URLs to fetch");
        return Ok(());
    }

    let store = Store::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    let fetcher = ReqwestFetcher::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })
    .context("failed to build HTTP client")?;

    let mut options = PipelineOptions::from_config(&config);
    options.enforce_policy |= cli.robotstxt;
    options.force_refresh = cli.force;

    tracing::info!(
        urls = urls.len(),
        robotstxt = options.enforce_policy,
        force = options.force_refresh,
        "starting fetch run"
    );

    let pipeline = FetchPipeline::new(store, Arc::new(fetcher), &config, options);
    let (reports, summary) = pipeline.run(urls).await;

    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }

    tracing::info!(
        total = summary.total,
        fetched = summary.fetched,
        unmodified = summary.unmodified,
        blocked = summary.blocked,
        failed = summary.failed,
        "run complete"
    );

    Ok(())
}
