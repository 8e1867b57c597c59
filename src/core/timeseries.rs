//! Time-series store abstractions

use crate::core::error::StoreError;
use async_trait::async_trait;
use std::fmt::Display;

/// How the store treats a second write at an existing timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the earliest written value, ignore later ones.
    #[default]
    First,
}

impl Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::First => write!(f, "first"),
        }
    }
}

/// Upper bound of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeEnd {
    /// Through the latest available sample (`+` on the wire).
    #[default]
    Latest,
}

impl Display for RangeEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeEnd::Latest => write!(f, "+"),
        }
    }
}

/// One point destined for a multi-series append.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub key: String,
    pub timestamp_ms: i64,
    pub value: f64,
}

impl DataPoint {
    pub fn new(key: impl Into<String>, timestamp_ms: i64, value: f64) -> Self {
        Self {
            key: key.into(),
            timestamp_ms,
            value,
        }
    }
}

/// An averaged bucket: `(bucket start in ms, mean of values in the bucket)`.
pub type Bucket = (i64, f64);

#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Creates an empty series. Fails with [`StoreError::Command`] if it exists.
    async fn create_series(&self, key: &str, policy: DuplicatePolicy) -> Result<(), StoreError>;

    /// Appends every point in a single batched command.
    async fn append_many(&self, points: &[DataPoint]) -> Result<(), StoreError>;

    /// Averages `key` into `bucket_ms` wide buckets from `from_ms` to `to`,
    /// ascending by bucket start. No data is an empty vector, not an error.
    /// Timestamps are unsigned on the store side, so a negative `from_ms` is
    /// rejected.
    async fn range_average(
        &self,
        key: &str,
        from_ms: i64,
        to: RangeEnd,
        bucket_ms: u64,
    ) -> Result<Vec<Bucket>, StoreError>;
}
