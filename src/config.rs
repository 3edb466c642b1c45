//! Configuration resolution for capitol-sync
//!
//! Configuration is resolved once at startup with ENV → TOML priority
//! and handed to the rest of the service as an immutable value. Inner
//! components never read process state themselves.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_API_BASE_URL: &str = "https://api.congress.gov/v3";
const DEFAULT_DATABASE_PATH: &str = "capitol-sync.db";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";

/// How backoff delays are randomized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterMode {
    /// Uniform over `[0, delay]`, desynchronizing concurrent retriers
    Full,
    /// Use the computed delay as-is
    None,
}

/// Retry behavior for a single logical upstream fetch.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per logical fetch, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; later attempts scale by the multiplier
    pub base_delay: Duration,
    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter applied to each backoff delay
    pub jitter: JitterMode,
    /// Hard timeout applied independently to every attempt
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: JitterMode::Full,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// congress.gov API key (required)
    pub api_key: String,
    /// Upstream API base URL
    pub api_base_url: String,
    /// SQLite database file path
    pub database_path: String,
    /// HTTP listen address
    pub bind_address: String,
    /// Retry policy for upstream fetches
    pub retry: RetryPolicy,
    /// Page size requested from the upstream member list
    pub page_limit: u32,
    /// Members reconciled concurrently per batch
    pub batch_size: usize,
    /// Pause between consecutive batches
    pub batch_pause: Duration,
    /// Client-side upstream request rate cap (requests/second)
    pub requests_per_second: u32,
}

impl Config {
    /// Resolve configuration from the environment, with an optional
    /// TOML file as fallback for individual values.
    ///
    /// A missing API key is fatal: the service refuses to start rather
    /// than failing per-request.
    pub fn load() -> Result<Self> {
        let toml_config = match std::env::var("CAPITOL_SYNC_CONFIG") {
            Ok(path) => read_toml_config(Path::new(&path))?,
            Err(_) => TomlConfig::default(),
        };

        let mut config = Self::with_api_key(resolve_api_key(&toml_config)?);

        config.api_base_url = std::env::var("CONGRESS_API_BASE_URL")
            .ok()
            .or(toml_config.api_base_url)
            .unwrap_or(config.api_base_url);

        config.database_path = std::env::var("CAPITOL_SYNC_DB")
            .ok()
            .or(toml_config.database_path)
            .unwrap_or(config.database_path);

        config.bind_address = std::env::var("CAPITOL_SYNC_BIND")
            .ok()
            .or(toml_config.bind_address)
            .unwrap_or(config.bind_address);

        Ok(config)
    }

    /// Configuration with pipeline defaults and the given API key.
    /// Used by `load()` and as a base for test fixtures.
    pub fn with_api_key(api_key: String) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            retry: RetryPolicy::default(),
            page_limit: 250,
            batch_size: 10,
            batch_pause: Duration::from_millis(500),
            requests_per_second: 2,
        }
    }
}

/// Optional TOML configuration file shape
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub database_path: Option<String>,
    pub bind_address: Option<String>,
}

fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Resolve the congress.gov API key with ENV → TOML priority.
fn resolve_api_key(toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var("CONGRESS_API_KEY").ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config.api_key.as_ref().filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("Congress API key found in both environment and TOML. Using environment.");
    }

    if let Some(key) = env_key {
        info!("Congress API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Congress API key loaded from TOML config");
        return Ok(key.clone());
    }

    Err(Error::Config(
        "Congress API key not configured. Provide one via:\n\
         1. Environment: CONGRESS_API_KEY=your-key-here\n\
         2. TOML config: api_key = \"your-key\" (path in CAPITOL_SYNC_CONFIG)\n\
         \n\
         Obtain an API key at: https://api.congress.gov/sign-up"
            .to_string(),
    ))
}

/// Validate API key (non-empty, non-whitespace)
fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
