//! Output writers.
//!
//! - [`json`]: one JSON file per enriched article, plus the hit-count summary
//!   written in `--hits-only` mode

pub mod json;
