//! # Climate Count
//!
//! Collects news articles matching a query from the New York Times Article
//! Search API, one day at a time across a date range, scrapes each article's
//! text, and counts occurrences of a fixed vocabulary of climate terms.
//!
//! ## Usage
//!
//! ```sh
//! climate_count 20240101 20240131 climate
//! ```
//!
//! ## Architecture
//!
//! 1. **Setup**: load secrets, settings and vocabulary; build the term matcher
//! 2. **Search**: page through the results for each day, paced to the API limit
//! 3. **Enrich**: scrape article text and count terms (several articles at a time)
//! 4. **Output**: write one JSON file per article, named by its id

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dates;
mod error;
mod matcher;
mod models;
mod outputs;
mod pacing;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::Settings;
use pipeline::RunContext;
use scrapers::article::ArticleFetcher;
use scrapers::nyt::SearchClient;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("climate_count starting up");

    let args = Cli::parse();
    debug!(?args.start_date, ?args.end_date, ?args.query_term, "Parsed CLI arguments");

    // ---- Setup: everything here is fatal ----
    let days = dates::expand(&args.start_date, &args.end_date)?;
    let mut settings = Settings::load(&args.secrets, &args.config, args.api_key.as_deref())?;
    if let Some(workers) = args.workers {
        settings.workers = workers.max(1);
    }

    let http = scrapers::http_client(settings.timeout)?;
    let search = SearchClient::from_settings(http.clone(), &settings);
    info!(
        days = days.len(),
        query = %args.query_term,
        estimated_min_secs = (days.len() as f64 * settings.request_interval.as_secs_f64()) as u64,
        "Date range expanded"
    );

    if args.hits_only {
        utils::ensure_writable_dir(&settings.output_dir).await?;
        let (counts, failed) = pipeline::run_hits_only(&search, &days, &args.query_term).await;
        outputs::json::save_hit_counts(
            &counts,
            &settings.output_dir,
            &args.start_date,
            &args.end_date,
        )
        .await?;
        info!(
            days = days.len(),
            failed,
            total_hits = counts.values().sum::<u64>(),
            elapsed_secs = start_time.elapsed().as_secs(),
            "Hit counts complete"
        );
        if failed > 0 {
            return Err(format!("{failed} day(s) failed to query").into());
        }
        return Ok(());
    }

    let ctx = RunContext::init(&settings, &args.terms, ArticleFetcher::new(http)).await?;
    let summary = pipeline::run(&search, &ctx, &days, &args.query_term).await;

    let elapsed = start_time.elapsed();
    info!(
        days = summary.days,
        days_failed = summary.days_failed,
        documents = summary.documents,
        saved = summary.saved,
        failed = summary.failed,
        secs = elapsed.as_secs(),
        "Execution complete"
    );

    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some documents were skipped");
    }
    if summary.days_failed > 0 {
        error!(days_failed = summary.days_failed, "Some days could not be searched");
        return Err(format!("{} day(s) failed to search", summary.days_failed).into());
    }

    Ok(())
}
