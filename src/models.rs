//! Data models for search-API responses and the enriched records written to disk.
//!
//! - [`SearchResponse`]: one page returned by the article search endpoint
//! - [`SearchResultDoc`]: a single article record as the API returns it
//! - [`EnrichedDoc`]: the same record with `multimedia` dropped and the scraped
//!   `text` plus per-term `term_counts` attached
//!
//! The API sends many metadata fields (headline, pub_date, keywords, ...). Only
//! `_id` and `web_url` are needed here; everything else rides along untouched
//! in a flattened map so it round-trips to the output file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-term match counts for one document. Every vocabulary term is a key.
pub type TermCounts = BTreeMap<String, usize>;

/// Top-level body of an article search response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub response: SearchResponseBody,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponseBody {
    pub meta: SearchMeta,
    /// Raw result records. Each one is decoded into a [`SearchResultDoc`] on
    /// its own, so a malformed record does not spoil the rest of the page.
    /// Absent on some empty result pages.
    #[serde(default)]
    pub docs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchMeta {
    /// Total number of articles matching the query for the requested range.
    pub hits: u64,
}

/// One article record from the search API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchResultDoc {
    /// Unique identifier, e.g. `nyt://article/0b0f4b0c-...`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Canonical article URL; the page that gets scraped.
    pub web_url: String,
    /// Image references. Large and unused downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multimedia: Option<Value>,
    /// Remaining API metadata, passed through as-is.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Keys the enrichment writes itself; upstream values under these names are dropped.
const ENRICHED_KEYS: [&str; 2] = ["text", "term_counts"];

/// A search result after enrichment; this is what gets persisted.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EnrichedDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub web_url: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    /// Paragraph text scraped from `web_url`, boilerplate stripped.
    pub text: String,
    pub term_counts: TermCounts,
}

impl EnrichedDoc {
    /// Build the enriched record from a search result. `multimedia` is not carried over,
    /// and any upstream `text` or `term_counts` field is replaced by the scraped values.
    pub fn from_result(doc: &SearchResultDoc, text: String, term_counts: TermCounts) -> Self {
        let mut metadata = doc.metadata.clone();
        for key in ENRICHED_KEYS {
            metadata.remove(key);
        }
        Self {
            id: doc.id.clone(),
            web_url: doc.web_url.clone(),
            metadata,
            text,
            term_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_page() -> Value {
        json!({
            "status": "OK",
            "response": {
                "meta": { "hits": 1, "offset": 0, "time": 12 },
                "docs": [{
                    "_id": "nyt://article/abc-123",
                    "web_url": "https://www.nytimes.com/2024/01/01/climate/story.html",
                    "headline": { "main": "A Story" },
                    "pub_date": "2024-01-01T10:00:00+0000",
                    "multimedia": [{ "url": "images/big.jpg", "width": 2048 }]
                }]
            }
        })
    }

    #[test]
    fn test_search_response_deserialization() {
        let page: SearchResponse = serde_json::from_value(sample_page()).unwrap();
        assert_eq!(page.response.meta.hits, 1);
        assert_eq!(page.response.docs.len(), 1);

        let doc: SearchResultDoc = serde_json::from_value(page.response.docs[0].clone()).unwrap();
        assert_eq!(doc.id, "nyt://article/abc-123");
        assert!(doc.multimedia.is_some());
        assert_eq!(doc.metadata["pub_date"], "2024-01-01T10:00:00+0000");
        assert!(!doc.metadata.contains_key("multimedia"));
    }

    #[test]
    fn test_search_response_without_docs() {
        let page: SearchResponse =
            serde_json::from_value(json!({ "response": { "meta": { "hits": 0 } } })).unwrap();
        assert_eq!(page.response.meta.hits, 0);
        assert!(page.response.docs.is_empty());
    }

    #[test]
    fn test_search_response_missing_meta_is_an_error() {
        let result = serde_json::from_value::<SearchResponse>(json!({ "response": { "docs": [] } }));
        assert!(result.is_err());
    }

    #[test]
    fn test_enriched_doc_drops_multimedia_and_keeps_metadata() {
        let page: SearchResponse = serde_json::from_value(sample_page()).unwrap();
        let doc: SearchResultDoc = serde_json::from_value(page.response.docs[0].clone()).unwrap();

        let mut counts = TermCounts::new();
        counts.insert("climate".to_string(), 2);
        let enriched = EnrichedDoc::from_result(&doc, "climate talk".to_string(), counts);

        let out = serde_json::to_value(&enriched).unwrap();
        assert_eq!(out["_id"], "nyt://article/abc-123");
        assert_eq!(out["headline"]["main"], "A Story");
        assert_eq!(out["text"], "climate talk");
        assert_eq!(out["term_counts"]["climate"], 2);
        assert!(out.get("multimedia").is_none());
    }

    #[test]
    fn test_malformed_record_does_not_spoil_the_page() {
        let page: SearchResponse = serde_json::from_value(json!({
            "response": {
                "meta": { "hits": 2 },
                "docs": [
                    { "_id": "nyt://article/ok", "web_url": "https://example.com/ok" },
                    { "_id": "nyt://article/bad", "web_url": null }
                ]
            }
        }))
        .unwrap();
        assert_eq!(page.response.docs.len(), 2);
        assert!(serde_json::from_value::<SearchResultDoc>(page.response.docs[0].clone()).is_ok());
        assert!(serde_json::from_value::<SearchResultDoc>(page.response.docs[1].clone()).is_err());
    }

    #[test]
    fn test_enriched_fields_replace_upstream_keys() {
        let doc: SearchResultDoc = serde_json::from_value(json!({
            "_id": "nyt://article/dup",
            "web_url": "https://example.com/dup",
            "text": "upstream snippet",
            "term_counts": { "stale": 9 },
            "section_name": "Climate"
        }))
        .unwrap();

        let mut counts = TermCounts::new();
        counts.insert("climate".to_string(), 1);
        let enriched = EnrichedDoc::from_result(&doc, "scraped body".to_string(), counts);
        assert!(!enriched.metadata.contains_key("text"));
        assert!(!enriched.metadata.contains_key("term_counts"));
        assert_eq!(enriched.metadata["section_name"], "Climate");

        let json = serde_json::to_string(&enriched).unwrap();
        assert_eq!(json.matches("\"text\"").count(), 1);
        assert_eq!(json.matches("\"term_counts\"").count(), 1);
        let out: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(out["text"], "scraped body");
        assert_eq!(out["term_counts"], json!({ "climate": 1 }));
    }

    #[test]
    fn test_enriched_doc_roundtrip() {
        let json = json!({
            "_id": "nyt://article/x",
            "web_url": "https://example.com/x",
            "section_name": "Climate",
            "text": "body",
            "term_counts": { "climate": 0 }
        });
        let doc: EnrichedDoc = serde_json::from_value(json).unwrap();
        assert_eq!(doc.metadata["section_name"], "Climate");
        assert_eq!(doc.term_counts["climate"], 0);
        assert!(!doc.metadata.contains_key("text"));
    }
}
