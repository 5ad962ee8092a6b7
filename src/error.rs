//! Error taxonomy for the collection run.
//!
//! Startup failures ([`CountError::Config`], [`CountError::Format`]) abort the
//! run. Everything else is raised per day or per document and is isolated by
//! the orchestrator in [`crate::pipeline`].

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CountError>;

#[derive(Debug, Error)]
pub enum CountError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid date \"{value}\": expected YYYYMMDD ({reason})")]
    Format { value: String, reason: String },

    #[error("HTTP error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid article URL \"{url}\": {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("rate limited by {url}")]
    RateLimited { url: String },

    #[error("malformed response for {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot derive a filename from document id \"{id}\"")]
    BadDocumentId { id: String },
}

impl CountError {
    /// Network failures, HTTP 429 and 5xx responses. Everything else fails
    /// the same way on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            CountError::Fetch(_) | CountError::RateLimited { .. } => true,
            CountError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
