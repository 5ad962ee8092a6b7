//! Secrets and settings loading.
//!
//! Two small YAML documents are read once at startup:
//!
//! ```yaml
//! # .secret.yaml
//! nyt: YOUR_API_KEY
//! ```
//!
//! ```yaml
//! # .config.yaml
//! json: ./json                  # output directory (required)
//! search_url: https://api.nytimes.com/svc/search/v2/articlesearch.json
//! request_interval_secs: 6.15
//! timeout_secs: 30
//! max_retries: 3
//! workers: 4
//! ```
//!
//! Everything except `json` (and the API key) has a default.

use crate::error::{CountError, Result};
use crate::pacing::DEFAULT_REQUEST_INTERVAL;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Parsed key-value document.
pub type ConfigMap = BTreeMap<String, Value>;

pub const DEFAULT_SECRETS_FILE: &str = ".secret.yaml";
pub const DEFAULT_CONFIG_FILE: &str = ".config.yaml";
pub const DEFAULT_TERMS_FILE: &str = "search_terms.txt";
pub const DEFAULT_SEARCH_URL: &str = "https://api.nytimes.com/svc/search/v2/articlesearch.json";

const API_KEY: &str = "nyt";
const OUTPUT_DIR: &str = "json";

/// Read a YAML mapping from `path`.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_config(path: &Path) -> Result<ConfigMap> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CountError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&raw).map_err(|e| CountError::Config(format!("{}: {e}", path.display())))
}

fn parse_config(raw: &str) -> std::result::Result<ConfigMap, String> {
    let value: Value = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
    let Value::Mapping(mapping) = value else {
        return Err("expected a key-value mapping".to_string());
    };
    mapping
        .into_iter()
        .map(|(k, v)| match k {
            Value::String(key) => Ok((key, v)),
            other => Err(format!("non-string key {other:?}")),
        })
        .collect()
}

/// Runtime settings, resolved once and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub output_dir: PathBuf,
    pub search_url: String,
    pub request_interval: Duration,
    pub timeout: Duration,
    pub max_retries: usize,
    pub workers: usize,
}

impl Settings {
    /// Load both documents. `api_key_override` (CLI flag or `NYT_API_KEY`)
    /// takes precedence over the secrets file, which then need not exist.
    pub fn load(
        secrets_path: &Path,
        config_path: &Path,
        api_key_override: Option<&str>,
    ) -> Result<Self> {
        let secrets = match api_key_override {
            Some(_) if !secrets_path.exists() => ConfigMap::new(),
            _ => read_config(secrets_path)?,
        };
        let config = read_config(config_path)?;
        let settings = Self::from_maps(&secrets, &config, api_key_override)?;
        info!(
            output_dir = %settings.output_dir.display(),
            search_url = %settings.search_url,
            interval_ms = settings.request_interval.as_millis() as u64,
            workers = settings.workers,
            "Loaded settings"
        );
        Ok(settings)
    }

    pub fn from_maps(
        secrets: &ConfigMap,
        config: &ConfigMap,
        api_key_override: Option<&str>,
    ) -> Result<Self> {
        let api_key = match api_key_override {
            Some(key) => key.to_string(),
            None => required_str(secrets, API_KEY, "secrets")?,
        };
        if api_key.trim().is_empty() {
            return Err(CountError::Config("API key is empty".to_string()));
        }

        let output_dir = PathBuf::from(required_str(config, OUTPUT_DIR, "settings")?);
        let search_url = optional_str(config, "search_url")?
            .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string());

        let request_interval = match optional_f64(config, "request_interval_secs")? {
            Some(secs) if secs >= 0.0 && secs.is_finite() => Duration::from_secs_f64(secs),
            Some(secs) => {
                return Err(CountError::Config(format!(
                    "request_interval_secs must be a non-negative number, got {secs}"
                )));
            }
            None => DEFAULT_REQUEST_INTERVAL,
        };
        let timeout = Duration::from_secs(optional_u64(config, "timeout_secs")?.unwrap_or(30));
        let max_retries = optional_u64(config, "max_retries")?.unwrap_or(3) as usize;
        let workers = optional_u64(config, "workers")?.unwrap_or(4).max(1) as usize;

        Ok(Self {
            api_key,
            output_dir,
            search_url,
            request_interval,
            timeout,
            max_retries,
            workers,
        })
    }
}

fn required_str(map: &ConfigMap, key: &str, doc: &str) -> Result<String> {
    optional_str(map, key)?
        .ok_or_else(|| CountError::Config(format!("missing key `{key}` in {doc}")))
}

fn optional_str(map: &ConfigMap, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(key, "a string", other)),
    }
}

fn optional_f64(map: &ConfigMap, key: &str) -> Result<Option<f64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "a number", &Value::Number(n.clone()))),
        Some(other) => Err(wrong_type(key, "a number", other)),
    }
}

fn optional_u64(map: &ConfigMap, key: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "a non-negative integer", &Value::Number(n.clone()))),
        Some(other) => Err(wrong_type(key, "a non-negative integer", other)),
    }
}

fn wrong_type(key: &str, expected: &str, got: &Value) -> CountError {
    CountError::Config(format!("`{key}` must be {expected}, got {got:?}"))
}
