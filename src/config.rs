//! Configuration loading for the `mimir` command-line client.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.mimir/config.toml` (user)
//! 3. `/etc/mimir/config.toml` (system)
//!
//! With no file at all, built-in defaults are used.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;
use crate::cache::CacheConfig;
use crate::control::RetryPolicy;
use crate::gateway::{Mimir, MimirBuilder, PacingConfig};
use crate::store::FileStore;
use crate::{MimirError, Result};

/// Client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub pacing: PacingSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub state: StateSection,
}

/// Backend connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix (default: http://127.0.0.1:8000/api).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Result cache sizes and lifetimes.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Document listings stay fresh this long (default: 30).
    #[serde(default = "default_documents_ttl")]
    pub documents_ttl_secs: u64,
    #[serde(default = "default_documents_entries")]
    pub documents_max_entries: usize,
    #[serde(default = "default_artifacts_entries")]
    pub artifacts_max_entries: usize,
    #[serde(default = "default_search_entries")]
    pub search_max_entries: usize,
    #[serde(default = "default_suggestions_entries")]
    pub suggestions_max_entries: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            documents_ttl_secs: default_documents_ttl(),
            documents_max_entries: default_documents_entries(),
            artifacts_max_entries: default_artifacts_entries(),
            search_max_entries: default_search_entries(),
            suggestions_max_entries: default_suggestions_entries(),
        }
    }
}

fn default_documents_ttl() -> u64 {
    30
}

fn default_documents_entries() -> usize {
    20
}

fn default_artifacts_entries() -> usize {
    100
}

fn default_search_entries() -> usize {
    20
}

fn default_suggestions_entries() -> usize {
    50
}

/// Debounce and throttle timings in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingSection {
    #[serde(default = "default_documents_debounce")]
    pub documents_debounce_ms: u64,
    #[serde(default = "default_documents_interval")]
    pub documents_min_interval_ms: u64,
    #[serde(default = "default_suggestions_debounce")]
    pub suggestions_debounce_ms: u64,
}

impl Default for PacingSection {
    fn default() -> Self {
        Self {
            documents_debounce_ms: default_documents_debounce(),
            documents_min_interval_ms: default_documents_interval(),
            suggestions_debounce_ms: default_suggestions_debounce(),
        }
    }
}

fn default_documents_debounce() -> u64 {
    1000
}

fn default_documents_interval() -> u64 {
    2000
}

fn default_suggestions_debounce() -> u64 {
    500
}

/// Delays before the single retry after a rate limit, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_ai_delay")]
    pub ai_delay_ms: u64,
    #[serde(default = "default_documents_delay")]
    pub documents_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            ai_delay_ms: default_ai_delay(),
            documents_delay_ms: default_documents_delay(),
        }
    }
}

fn default_ai_delay() -> u64 {
    2000
}

fn default_documents_delay() -> u64 {
    5000
}

/// Durable state location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateSection {
    /// State file (default: `<data_dir>/mimir/state.json`).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.mimir/config.toml`
    /// 3. `/etc/mimir/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MimirError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MimirError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mimir").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/mimir/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state
            .path
            .clone()
            .unwrap_or_else(FileStore::default_path)
    }

    pub fn pacing_config(&self) -> PacingConfig {
        PacingConfig::new()
            .documents_debounce(Duration::from_millis(self.pacing.documents_debounce_ms))
            .documents_min_interval(Duration::from_millis(self.pacing.documents_min_interval_ms))
            .suggestions_debounce(Duration::from_millis(self.pacing.suggestions_debounce_ms))
    }

    /// Gateway builder with every configured value applied.
    ///
    /// The caller still chooses the state store.
    pub fn builder(&self) -> MimirBuilder {
        let cache = &self.cache;
        Mimir::builder()
            .base_url(&self.api.base_url)
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .documents_cache(
                CacheConfig::new()
                    .max_entries(cache.documents_max_entries)
                    .ttl(Duration::from_secs(cache.documents_ttl_secs)),
            )
            .artifacts_cache(CacheConfig::new().max_entries(cache.artifacts_max_entries))
            .search_cache(CacheConfig::new().max_entries(cache.search_max_entries))
            .suggestions_cache(CacheConfig::new().max_entries(cache.suggestions_max_entries))
            .ai_retry(RetryPolicy::ai_features().delay(Duration::from_millis(self.retry.ai_delay_ms)))
            .documents_retry(
                RetryPolicy::documents().delay(Duration::from_millis(self.retry.documents_delay_ms)),
            )
            .pacing(self.pacing_config())
    }
}
