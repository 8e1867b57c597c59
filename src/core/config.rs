use crate::core::keys::DEFAULT_KEY_PREFIX;
use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_STORE_URL: &str = "redis://redis:6379/0";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;
pub const STORE_URL_ENV: &str = "REDIS_URL";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default)]
    pub backend: StoreBackend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            url: default_store_url(),
            backend: StoreBackend::default(),
        }
    }
}

/// How the price and sentiment bucket sequences are matched up.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PairingMode {
    /// By index, truncated to the shorter sequence.
    #[default]
    Positional,
    /// By equal bucket timestamp; unmatched buckets are dropped.
    Timestamp,
}

/// Aggregation window. Both sizes must be set explicitly.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WindowConfig {
    /// How far back from now the range query starts, in seconds.
    pub lookback_secs: u64,
    /// Width of each averaging bucket, in milliseconds.
    pub bucket_ms: u64,
    #[serde(default)]
    pub pairing: PairingMode,
}

impl WindowConfig {
    /// `None` when `lookback_secs` is too large for a signed duration.
    pub fn lookback(&self) -> Option<chrono::TimeDelta> {
        i64::try_from(self.lookback_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    pub window: WindowConfig,
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "btc-sentiment", "btc-sentiment-cache")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config.with_env_overrides())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.window.lookback_secs > 0, "window.lookback_secs must be positive");
        ensure!(
            self.window.lookback().is_some(),
            "window.lookback_secs is out of range: {}",
            self.window.lookback_secs
        );
        ensure!(self.window.bucket_ms > 0, "window.bucket_ms must be positive");
        ensure!(
            i64::try_from(self.window.bucket_ms).is_ok(),
            "window.bucket_ms is out of range: {}",
            self.window.bucket_ms
        );
        ensure!(self.cache_ttl_secs > 0, "cache_ttl_secs must be positive");
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(STORE_URL_ENV) {
            debug!("Store url overridden from {STORE_URL_ENV}");
            self.store.url = url;
        }
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
