//! Remote sources: the article search API and the article pages it points at.
//!
//! | Module | Source | Method |
//! |--------|--------|--------|
//! | [`nyt`] | Article Search API | JSON, paginated, paced and retried |
//! | [`article`] | Article web pages | HTML scraping of `<p>` text |
//!
//! Both share one [`reqwest::Client`] built by [`http_client`].

pub mod article;
pub mod nyt;

use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with request and connect timeouts.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
}
