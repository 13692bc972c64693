//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (JINAMD_*)
//! 2. TOML config file (if JINAMD_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (JINAMD_*)
/// 2. TOML config file (if JINAMD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the rendering service. The target URL is appended as a path suffix.
    ///
    /// Set via JINAMD_READER_BASE_URL environment variable.
    #[serde(default = "default_reader_base_url")]
    pub reader_base_url: String,

    /// Optional bearer token for the rendering service.
    ///
    /// Set via JINAMD_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// User-Agent string for outbound requests.
    ///
    /// Set via JINAMD_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Outbound request timeout in milliseconds.
    ///
    /// Set via JINAMD_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum Markdown body size in bytes.
    ///
    /// Set via JINAMD_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum number of documents kept in memory before LRU eviction.
    ///
    /// Set via JINAMD_CACHE_MAX_ENTRIES environment variable.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Lifetime of a cached document in seconds; 0 keeps documents until evicted.
    ///
    /// Set via JINAMD_CACHE_TTL_SECS environment variable.
    #[serde(default)]
    pub cache_ttl_secs: u64,

    /// Model name used to pick the BPE for token estimates.
    ///
    /// Set via JINAMD_TOKENIZER_MODEL environment variable.
    #[serde(default = "default_tokenizer_model")]
    pub tokenizer_model: String,
}

fn default_reader_base_url() -> String {
    "https://r.jina.ai".into()
}

fn default_user_agent() -> String {
    "jinamd/0.1".into()
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_cache_max_entries() -> usize {
    1_000
}

fn default_tokenizer_model() -> String {
    "gpt-4".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reader_base_url: default_reader_base_url(),
            api_key: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            cache_max_entries: default_cache_max_entries(),
            cache_ttl_secs: 0,
            tokenizer_model: default_tokenizer_model(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache TTL, or `None` when documents never expire.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `JINAMD_`
    /// 2. TOML file from `JINAMD_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("JINAMD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("JINAMD_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
