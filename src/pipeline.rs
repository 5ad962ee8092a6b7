//! Enrichment and the day-by-day collection loop.
//!
//! For each day, in order:
//! 1. **Search**: fetch every result document for the query (sequential, paced)
//! 2. **Enrich**: scrape each article's text and count vocabulary terms
//!    (up to `workers` articles at a time)
//! 3. **Persist**: write each enriched document to its own JSON file
//!
//! A document that fails to decode, enrich or save is logged and skipped. A day
//! whose search fails is logged and skipped. Both are counted in the [`RunSummary`].

use crate::config::Settings;
use crate::error::Result;
use crate::matcher::{TermMatcher, TermVocabulary, count};
use crate::models::{EnrichedDoc, SearchResultDoc};
use crate::outputs::json::save_doc;
use crate::pacing::RateLimiter;
use crate::scrapers::article::ArticleFetcher;
use crate::scrapers::nyt::SearchClient;
use crate::utils::ensure_writable_dir;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

/// Everything an enrichment needs, built once at startup and shared read-only.
#[derive(Debug)]
pub struct RunContext {
    pub vocabulary: TermVocabulary,
    pub matcher: TermMatcher,
    pub fetcher: ArticleFetcher,
    pub output_dir: PathBuf,
    pub workers: usize,
}

impl RunContext {
    pub fn new(
        vocabulary: TermVocabulary,
        fetcher: ArticleFetcher,
        output_dir: PathBuf,
        workers: usize,
    ) -> Self {
        let matcher = TermMatcher::new(&vocabulary);
        Self {
            vocabulary,
            matcher,
            fetcher,
            output_dir,
            workers: workers.max(1),
        }
    }

    /// Load the vocabulary, build the matcher, and make sure the output
    /// directory exists and is writable.
    pub async fn init(settings: &Settings, terms_path: &Path, fetcher: ArticleFetcher) -> Result<Self> {
        let vocabulary = TermVocabulary::load(terms_path)?;
        ensure_writable_dir(&settings.output_dir).await?;
        Ok(Self::new(
            vocabulary,
            fetcher,
            settings.output_dir.clone(),
            settings.workers,
        ))
    }
}

/// Scrape `doc`'s article and attach its text and term counts.
///
/// # Arguments
///
/// * `doc` - Search result to enrich; it is only read
/// * `ctx` - Shared run context holding the vocabulary, matcher and fetcher
///
/// # Returns
///
/// A new [`EnrichedDoc`] carrying the scraped text and a count for every
/// vocabulary term. `multimedia` is not carried over.
///
/// # Errors
///
/// Returns `InvalidUrl`, `Fetch` or `HttpStatus` when the article page
/// cannot be retrieved.
#[instrument(level = "debug", skip_all, fields(id = %doc.id))]
pub async fn enrich(doc: &SearchResultDoc, ctx: &RunContext) -> Result<EnrichedDoc> {
    let text = ctx.fetcher.extract_text(&doc.web_url).await?;
    let matches = ctx.matcher.find_matches(&text);
    let term_counts = count(&ctx.vocabulary, &matches);
    Ok(EnrichedDoc::from_result(doc, text, term_counts))
}

/// Tally for a whole run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub days: usize,
    pub days_failed: usize,
    pub documents: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Tally for one day's documents.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DayOutcome {
    pub documents: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Enrich and save a batch of documents, isolating failures per document.
pub async fn process_docs(docs: &[SearchResultDoc], ctx: &RunContext) -> DayOutcome {
    let results: Vec<bool> = stream::iter(docs.iter())
        .map(|doc| async move {
            let outcome = match enrich(doc, ctx).await {
                Ok(enriched) => save_doc(&enriched, &ctx.output_dir).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(_) => true,
                Err(e) => {
                    error!(id = %doc.id, url = %doc.web_url, error = %e, "Document failed; skipping");
                    false
                }
            }
        })
        .buffer_unordered(ctx.workers)
        .collect()
        .await;

    let saved = results.iter().filter(|ok| **ok).count();
    DayOutcome {
        documents: docs.len(),
        saved,
        failed: docs.len() - saved,
    }
}

/// Search one day and process every document it returns.
#[instrument(level = "info", skip(client, ctx))]
pub async fn process_day<R: RateLimiter>(
    client: &SearchClient<R>,
    ctx: &RunContext,
    day: &str,
    query: &str,
) -> Result<DayOutcome> {
    let results = client.fetch_day(day, query).await?;
    let mut outcome = process_docs(&results.docs, ctx).await;
    outcome.documents += results.skipped;
    outcome.failed += results.skipped;
    info!(
        documents = outcome.documents,
        saved = outcome.saved,
        failed = outcome.failed,
        "Finished day"
    );
    Ok(outcome)
}

/// Collect, enrich and persist every day in `days`, in order.
///
/// The search client's rate limiter spaces requests, including the first
/// request of each new day.
///
/// # Arguments
///
/// * `client` - Paced search client
/// * `ctx` - Run context built once by [`RunContext::init`]
/// * `days` - Days to collect, as produced by [`crate::dates::expand`]
/// * `query` - Search term
///
/// # Returns
///
/// A [`RunSummary`] tallying days, documents, saves and failures. Failures
/// never abort the run: a failed day is counted in `days_failed`, a failed
/// document in `failed`.
pub async fn run<R: RateLimiter>(
    client: &SearchClient<R>,
    ctx: &RunContext,
    days: &[String],
    query: &str,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for day in days {
        summary.days += 1;
        match process_day(client, ctx, day, query).await {
            Ok(outcome) => {
                summary.documents += outcome.documents;
                summary.saved += outcome.saved;
                summary.failed += outcome.failed;
            }
            Err(e) => {
                error!(%day, error = %e, "Search failed for day; skipping");
                summary.days_failed += 1;
            }
        }
    }

    summary
}

/// Lightweight mode: hit counts per day without fetching any articles.
///
/// Days whose query fails are logged and left out of the map.
pub async fn run_hits_only<R: RateLimiter>(
    client: &SearchClient<R>,
    days: &[String],
    query: &str,
) -> (BTreeMap<String, u64>, usize) {
    let mut counts = BTreeMap::new();
    let mut failed = 0;

    for day in days {
        match client.hit_count(day, query).await {
            Ok(hits) => {
                info!(%day, hits, "Hit count");
                counts.insert(day.clone(), hits);
            }
            Err(e) => {
                warn!(%day, error = %e, "Hit count query failed; skipping day");
                failed += 1;
            }
        }
    }

    (counts, failed)
}
