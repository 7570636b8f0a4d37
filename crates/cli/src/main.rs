//! productshot entry point.
//!
//! Runs every query through the fetch, download and validate pipeline and
//! prints a summary. Logging goes to stderr; the summary goes to stdout.
//!
//! Exit status: 0 when every query found a product photo, 1 when any query
//! did not, 2 when configuration or provider wiring failed.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use productshot_client::{DownloadConfig, ImageDownloader, build_providers};
use productshot_core::{AppConfig, Pipeline, ResilientFetcher, ResultCache, RunSummary};

mod cli;

use cli::Cli;

const CONFIG_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(CONFIG_ERROR);
        }
    };

    let pipeline = match build_pipeline(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(CONFIG_ERROR);
        }
    };

    if cli.clean
        && let Err(e) = clean_images_dir(&config).await
    {
        tracing::error!("{e:#}");
        return ExitCode::FAILURE;
    }

    let queries = cli.queries();
    tracing::info!(
        queries = queries.len(),
        providers = ?pipeline.fetcher().provider_names(),
        "starting run"
    );

    let summary = pipeline.run(&queries).await;
    print_summary(&summary);

    if summary.all_succeeded() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("productshot=info,productshot_core=info,productshot_client=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_raw().context("failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let providers = build_providers(config).await.context("failed to set up providers")?;
    let fetcher = ResilientFetcher::new(providers, ResultCache::with_ttl(config.cache_ttl()));
    let downloader = ImageDownloader::new(DownloadConfig::from(config)).context("failed to set up downloader")?;

    Ok(Pipeline::new(fetcher, Arc::new(downloader)))
}

async fn clean_images_dir(config: &AppConfig) -> Result<()> {
    let dir = &config.images_dir;
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("failed to clean {}", dir.display())),
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    tracing::info!(dir = %dir.display(), "cleaned images directory");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    for outcome in &summary.outcomes {
        match &outcome.accepted {
            Some(image) => println!(
                "ok    {:<28} {} (score {:.2})",
                outcome.query,
                image.path.display(),
                image.background_score
            ),
            None => println!(
                "fail  {:<28} no product photo among {} candidate(s)",
                outcome.query, outcome.candidates_seen
            ),
        }
    }
    println!();
    println!("Total:     {}", summary.total());
    println!("Successes: {}", summary.successes());
    println!("Failures:  {}", summary.failures());
}
