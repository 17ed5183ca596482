mod catalog;
mod config;
mod export;
mod parser;
mod partition;
mod scraper;
mod watcher;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::catalog::CatalogClient;
use crate::config::Settings;
use crate::scraper::{ProductScraper, ScrapeStats};

#[derive(Parser)]
#[command(name = "waitrose_scraper", about = "Waitrose catalogue and product page scraper")]
struct Cli {
    /// Settings file with WebDriver endpoints and scrape knobs
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
    /// Log to a daily-rolling file instead of stdout
    #[arg(long)]
    log_file: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full scrape now
    Run {
        /// Max products to scrape (default: whole catalogue)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Watch the schedule file and run once per day
    Watch,
    /// Fetch the catalogue and print a summary
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file);

    let settings = Settings::load(&cli.settings)?;

    match cli.command {
        Commands::Run { limit } => run_once(&settings, limit).await,
        Commands::Watch => {
            info!(
                "Waitrose scraper watching {} for the daily trigger",
                settings.schedule_path.display()
            );
            watcher::watch(settings.schedule_path.clone(), || run_once(&settings, None)).await
        }
        Commands::Catalog => {
            let client =
                CatalogClient::new(&settings.api_url, &settings.category, settings.page_size)?;
            let products = client.fetch_all().await?;
            println!("Category: {}", settings.category);
            println!("Products: {}", products.len());
            if let Some(first) = products.first() {
                println!("First:    {} ({})", first.name, first.id);
            }
            Ok(())
        }
    }
}

/// One full scrape: reset the snapshot, fetch the catalogue, fan the
/// products out over the worker pool and wait for every worker to finish.
async fn run_once(settings: &Settings, limit: Option<usize>) -> Result<()> {
    let endpoints = settings.endpoint_urls();
    if endpoints.is_empty() {
        bail!("no WebDriver endpoints configured, nothing can scrape product pages");
    }

    export::reset_output(&settings.output_path)?;

    let client = CatalogClient::new(&settings.api_url, &settings.category, settings.page_size)?;
    let mut products = client.fetch_all().await?;
    if let Some(limit) = limit {
        products.truncate(limit);
    }
    info!(
        "Dispatching {} products to {} workers over {} endpoints",
        products.len(),
        settings.worker_count,
        endpoints.len()
    );

    let slices = partition::partition(products, settings.worker_count);
    let assignments = partition::bind_endpoints(slices, &endpoints);

    let mut handles = Vec::with_capacity(assignments.len());
    for (slice, endpoint) in assignments {
        let worker = ProductScraper::new(slice, endpoint, settings.output_path.clone());
        handles.push(tokio::spawn(worker.run()));
    }

    let mut stats = ScrapeStats::default();
    for handle in handles {
        match handle.await {
            Ok(worker_stats) => stats.merge(&worker_stats),
            Err(e) => warn!("Worker task died: {e}"),
        }
    }

    info!(
        "Scrape finished: {} products ({} ok, {} errors)",
        stats.total, stats.ok, stats.errors
    );
    Ok(())
}

fn init_tracing(log_file: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if log_file {
        let appender = tracing_appender::rolling::daily(".", "waitrose_scraper.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}
