//! Key names for the store's data structures

pub const DEFAULT_KEY_PREFIX: &str = "cache-key-prefix";

const SENTIMENT_SERIES: &str = "sentiment:mean:30s";
const PRICE_SERIES: &str = "price:mean:30s";
const CACHE_SLOT: &str = "cache";

/// Fully-qualified key for `logical_name` under `prefix`.
pub fn series_key(prefix: &str, logical_name: &str) -> String {
    format!("{prefix}:{logical_name}")
}

/// Namespace for every key this crate touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Time series of 30-second snapshots of BTC sentiment.
    pub fn sentiment(&self) -> String {
        series_key(&self.prefix, SENTIMENT_SERIES)
    }

    /// Time series of 30-second snapshots of BTC price.
    pub fn price(&self) -> String {
        series_key(&self.prefix, PRICE_SERIES)
    }

    /// Single slot holding the latest computed summary.
    pub fn cache(&self) -> String {
        series_key(&self.prefix, CACHE_SLOT)
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}
