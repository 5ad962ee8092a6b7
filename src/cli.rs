//! Command-line interface definitions.
//!
//! The three positionals are always required. Everything else has a default
//! that matches the layout of a checkout: `.secret.yaml`, `.config.yaml` and
//! `search_terms.txt` in the working directory.

use crate::config::{DEFAULT_CONFIG_FILE, DEFAULT_SECRETS_FILE, DEFAULT_TERMS_FILE};
use clap::Parser;
use std::path::PathBuf;

/// Collect articles matching a query for each day in a range and count
/// vocabulary terms in their text.
///
/// # Examples
///
/// ```sh
/// climate_count 20240101 20240131 climate
///
/// # Only record how many articles match each day
/// climate_count 20240101 20240131 climate --hits-only
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First day to collect, format: YYYYMMDD
    pub start_date: String,

    /// Last day to collect (inclusive), format: YYYYMMDD
    pub end_date: String,

    /// Term for the search query, e.g. 'climate'
    pub query_term: String,

    /// Secrets file holding the API key under `nyt`
    #[arg(long, default_value = DEFAULT_SECRETS_FILE)]
    pub secrets: PathBuf,

    /// Settings file holding the output directory under `json`
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Vocabulary file, one phrase per line
    #[arg(short, long, default_value = DEFAULT_TERMS_FILE)]
    pub terms: PathBuf,

    /// Search API key (overrides the secrets file)
    #[arg(long, env = "NYT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Articles scraped concurrently (overrides `workers` in the settings file)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Only record per-day hit counts; skip article scraping
    #[arg(long)]
    pub hits_only: bool,
}
