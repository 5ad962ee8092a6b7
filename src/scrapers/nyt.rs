//! Article Search API client.
//!
//! Queries are made one day at a time (`begin_date` = `end_date` = the day).
//! The API returns 10 documents per page and reports the total in
//! `response.meta.hits`, so a day with `hits` results takes
//! `ceil(hits / 10)` requests. Every request goes through the rate limiter and
//! the retry policy.

use crate::api::Backoff;
use crate::config::Settings;
use crate::error::{CountError, Result};
use crate::models::{SearchResponse, SearchResultDoc};
use crate::pacing::{FixedInterval, RateLimiter};
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Documents per result page.
pub const PAGE_SIZE: u64 = 10;

/// Highest page index the API will serve.
pub const MAX_PAGE: u64 = 100;

/// Everything collected for one day.
#[derive(Debug, Default)]
pub struct DayResults {
    /// Decoded result documents, in page order.
    pub docs: Vec<SearchResultDoc>,
    /// Records that could not be decoded and were left out.
    pub skipped: usize,
}

impl DayResults {
    /// Decode the raw records of one page, logging and skipping bad ones.
    fn absorb(&mut self, raw_docs: Vec<Value>, page: u64) {
        for (index, raw) in raw_docs.into_iter().enumerate() {
            match serde_json::from_value::<SearchResultDoc>(raw) {
                Ok(doc) => self.docs.push(doc),
                Err(e) => {
                    warn!(page, index, error = %e, "Malformed search result; skipping document");
                    self.skipped += 1;
                }
            }
        }
        debug!(collected = self.docs.len(), skipped = self.skipped, page, "Fetched page");
    }

    /// Documents seen on the wire, decoded or not.
    pub fn received(&self) -> usize {
        self.docs.len() + self.skipped
    }
}

/// Paced, retrying client for the article search endpoint.
#[derive(Debug)]
pub struct SearchClient<R = FixedInterval> {
    client: Client,
    search_url: String,
    api_key: String,
    limiter: R,
    backoff: Backoff,
}

impl SearchClient<FixedInterval> {
    pub fn from_settings(client: Client, settings: &Settings) -> Self {
        let backoff = match settings.max_retries {
            0 => Backoff::none(),
            max_retries => Backoff {
                max_retries,
                ..Backoff::default()
            },
        };
        Self::new(
            client,
            settings.search_url.clone(),
            settings.api_key.clone(),
            FixedInterval::new(settings.request_interval),
            backoff,
        )
    }
}

impl<R: RateLimiter> SearchClient<R> {
    pub fn new(
        client: Client,
        search_url: String,
        api_key: String,
        limiter: R,
        backoff: Backoff,
    ) -> Self {
        Self {
            client,
            search_url,
            api_key,
            limiter,
            backoff,
        }
    }

    /// Fetch one result page for `query` on `day`.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_page(&self, day: &str, query: &str, page: u64) -> Result<SearchResponse> {
        let what = format!("search {day} page {page}");
        self.backoff
            .retry(&what, || async move {
                self.limiter.acquire().await;
                self.request_page(day, query, page).await
            })
            .await
    }

    async fn request_page(&self, day: &str, query: &str, page: u64) -> Result<SearchResponse> {
        let page_param = page.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", query),
                ("begin_date", day),
                ("end_date", day),
                ("api-key", self.api_key.as_str()),
                ("page", page_param.as_str()),
            ])
            .send()
            .await
            // The request URL carries the API key; keep it out of error messages.
            .map_err(|e| CountError::Fetch(e.without_url()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CountError::RateLimited {
                url: self.search_url.clone(),
            });
        }
        if !status.is_success() {
            return Err(CountError::HttpStatus {
                status: status.as_u16(),
                url: self.search_url.clone(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CountError::Fetch(e.without_url()))?;
        serde_json::from_str::<SearchResponse>(&body).map_err(|source| {
            warn!(
                day,
                page,
                error = %source,
                body_preview = %truncate_for_log(&body, 300),
                "Search response did not have the expected shape"
            );
            CountError::Parse {
                context: format!("search results for {day} page {page}"),
                source,
            }
        })
    }

    /// All result documents for `query` on `day`, in page order.
    ///
    /// Page 0 is requested first to learn `hits`; pages `1..ceil(hits / 10)`
    /// follow in order, each one paced and retried.
    ///
    /// # Arguments
    ///
    /// * `day` - Day to search, as `YYYYMMDD` (used as both `begin_date` and `end_date`)
    /// * `query` - Search term passed as `q`
    ///
    /// # Returns
    ///
    /// The decoded documents plus the number of malformed records that were
    /// skipped. When fewer documents come back than the API reported (a page
    /// came back short, or the page cap cut the walk off) the shortfall is
    /// logged and the partial result is returned.
    ///
    /// # Errors
    ///
    /// Returns the first page request that still fails after retries
    /// (`Fetch`, `HttpStatus`, `RateLimited`) or whose body is not a search
    /// response at all (`Parse`). Documents collected before the failure are
    /// discarded with it.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_day(&self, day: &str, query: &str) -> Result<DayResults> {
        let first = self.fetch_page(day, query, 0).await?;
        let hits = first.response.meta.hits;
        let total_pages = hits.div_ceil(PAGE_SIZE);
        info!(hits, total_pages, "Queried day");

        let mut results = DayResults::default();
        results.absorb(first.response.docs, 0);

        let last_page = total_pages.saturating_sub(1);
        if last_page > MAX_PAGE {
            warn!(
                total_pages,
                max_page = MAX_PAGE,
                "More result pages than the API serves; stopping at the page cap"
            );
        }

        for page in 1..=last_page.min(MAX_PAGE) {
            let response = self.fetch_page(day, query, page).await?;
            results.absorb(response.response.docs, page);
        }

        if (results.received() as u64) < hits {
            warn!(
                collected = results.received(),
                hits, "Collected fewer documents than reported hits; keeping partial result"
            );
        }
        Ok(results)
    }

    /// Total hits for `query` on `day`, from a single page-0 request.
    #[instrument(level = "info", skip(self))]
    pub async fn hit_count(&self, day: &str, query: &str) -> Result<u64> {
        let first = self.fetch_page(day, query, 0).await?;
        Ok(first.response.meta.hits)
    }
}
