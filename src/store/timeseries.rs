//! In-process time-series engine with the same semantics as the Redis module

use crate::core::error::StoreError;
use crate::core::timeseries::{Bucket, DataPoint, DuplicatePolicy, RangeEnd, TimeSeriesStore};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Points of one series. Only the `first` duplicate policy exists, so a
/// repeated timestamp keeps the value already stored.
#[derive(Default)]
struct Series {
    points: BTreeMap<i64, f64>,
}

impl Series {
    fn insert(&mut self, timestamp_ms: i64, value: f64) {
        self.points.entry(timestamp_ms).or_insert(value);
    }

    fn range_average(&self, from_ms: i64, to: RangeEnd, bucket_ms: i64) -> Vec<Bucket> {
        let upper = match to {
            RangeEnd::Latest => i64::MAX,
        };

        // (bucket start, sum, count), ascending because the source map is
        let mut buckets: Vec<(i64, f64, u64)> = Vec::new();
        for (&ts, &value) in self.points.range(from_ms..=upper) {
            let start = ts - ts.rem_euclid(bucket_ms);
            match buckets.last_mut() {
                Some((current, sum, count)) if *current == start => {
                    *sum += value;
                    *count += 1;
                }
                _ => buckets.push((start, value, 1)),
            }
        }

        buckets
            .into_iter()
            .map(|(start, sum, count)| (start, sum / count as f64))
            .collect()
    }
}

/// Thread-safe in-memory time-series store.
#[derive(Clone, Default)]
pub struct MemoryTimeSeries {
    series: Arc<RwLock<HashMap<String, Series>>>,
}

impl MemoryTimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points stored in `key`, if the series exists.
    pub async fn len(&self, key: &str) -> Option<usize> {
        self.series.read().await.get(key).map(|s| s.points.len())
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryTimeSeries {
    async fn create_series(&self, key: &str, policy: DuplicatePolicy) -> Result<(), StoreError> {
        let mut series = self.series.write().await;
        if series.contains_key(key) {
            return Err(StoreError::command(
                "TS.CREATE",
                "TSDB: key already exists",
            ));
        }
        debug!(key, %policy, "Created series");
        series.insert(key.to_string(), Series::default());
        Ok(())
    }

    async fn append_many(&self, points: &[DataPoint]) -> Result<(), StoreError> {
        let mut series = self.series.write().await;
        if let Some(missing) = points.iter().find(|p| !series.contains_key(&p.key)) {
            return Err(StoreError::command(
                "TS.MADD",
                format!("TSDB: the key {} does not exist", missing.key),
            ));
        }
        for point in points {
            if let Some(target) = series.get_mut(&point.key) {
                target.insert(point.timestamp_ms, point.value);
            }
        }
        debug!(count = points.len(), "Appended points");
        Ok(())
    }

    async fn range_average(
        &self,
        key: &str,
        from_ms: i64,
        to: RangeEnd,
        bucket_ms: u64,
    ) -> Result<Vec<Bucket>, StoreError> {
        let bucket_ms = i64::try_from(bucket_ms)
            .ok()
            .filter(|b| *b > 0)
            .ok_or_else(|| StoreError::command("TS.RANGE", "TSDB: invalid bucket duration"))?;
        if from_ms < 0 {
            return Err(StoreError::command("TS.RANGE", "TSDB: wrong fromTimestamp"));
        }

        let series = self.series.read().await;
        let target = series
            .get(key)
            .ok_or_else(|| StoreError::command("TS.RANGE", "TSDB: the key does not exist"))?;
        Ok(target.range_average(from_ms, to, bucket_ms))
    }
}
