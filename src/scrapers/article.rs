//! Article page scraper.
//!
//! Article text is the concatenation of every `<p>` element on the page, each
//! trimmed and joined with a single space. Pages wrap the story in a couple of
//! fixed boilerplate strings ("Advertisement", "Supported by") which are
//! stripped from the ends. No fallback exists for pages without paragraphs:
//! they yield an empty string.

use crate::error::{CountError, Result};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

const ADVERTISEMENT: &str = "Advertisement";
const SUPPORTED_BY: &str = "Supported by";

static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("paragraph selector is valid"));

/// Fetches article pages and reduces them to plain text.
#[derive(Debug, Clone)]
pub struct ArticleFetcher {
    client: Client,
}

impl ArticleFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download `url` and return its paragraph text with boilerplate removed.
    ///
    /// Network failures and non-2xx responses are errors; they are not retried.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn extract_text(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|source| CountError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CountError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let html = response.text().await?;

        let text = strip_boilerplate(&paragraph_text(&html));
        debug!(bytes = html.len(), chars = text.len(), "Parsed article");
        Ok(text)
    }
}

/// Trimmed text of every `<p>` element in document order, joined by one space.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop a leading and a trailing "Advertisement", then a leading "Supported by".
///
/// The order matters: "AdvertisementSupported by hello" becomes "hello".
pub fn strip_boilerplate(text: &str) -> String {
    let mut text = text;
    if let Some(rest) = text.strip_prefix(ADVERTISEMENT) {
        text = rest.trim();
    }
    if let Some(rest) = text.strip_suffix(ADVERTISEMENT) {
        text = rest.trim();
    }
    if let Some(rest) = text.strip_prefix(SUPPORTED_BY) {
        text = rest.trim();
    }
    text.to_string()
}
