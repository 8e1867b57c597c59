//! Redis-backed store speaking the RedisTimeSeries command protocol

use crate::core::cache::Cache;
use crate::core::error::StoreError;
use crate::core::timeseries::{Bucket, DataPoint, DuplicatePolicy, RangeEnd, TimeSeriesStore};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Cmd, RedisError};
use std::time::Duration;
use tracing::{debug, instrument};

pub(crate) const CREATE: &str = "TS.CREATE";
pub(crate) const MADD: &str = "TS.MADD";
pub(crate) const RANGE: &str = "TS.RANGE";

fn store_error(command: &'static str, err: RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::command(command, err.to_string())
    }
}

pub(crate) fn create_cmd(key: &str, policy: DuplicatePolicy) -> Cmd {
    let mut cmd = redis::cmd(CREATE);
    cmd.arg(key).arg("DUPLICATE_POLICY").arg(policy.to_string());
    cmd
}

pub(crate) fn madd_cmd(points: &[DataPoint]) -> Cmd {
    let mut cmd = redis::cmd(MADD);
    for point in points {
        cmd.arg(&point.key).arg(point.timestamp_ms).arg(point.value);
    }
    cmd
}

pub(crate) fn range_cmd(key: &str, from_ms: i64, to: RangeEnd, bucket_ms: u64) -> Cmd {
    let mut cmd = redis::cmd(RANGE);
    cmd.arg(key)
        .arg(from_ms)
        .arg(to.to_string())
        .arg("AGGREGATION")
        .arg("avg")
        .arg(bucket_ms);
    cmd
}

/// Time series and cache slot on one multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        debug!("Connected to store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl TimeSeriesStore for RedisStore {
    #[instrument(name = "StoreCreate", skip(self))]
    async fn create_series(&self, key: &str, policy: DuplicatePolicy) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = create_cmd(key, policy)
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error(CREATE, e))?;
        Ok(())
    }

    #[instrument(name = "StoreAppend", skip_all, fields(count = points.len()))]
    async fn append_many(&self, points: &[DataPoint]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // One timestamp per point on success; a per-point error fails the conversion
        let timestamps: Vec<i64> = madd_cmd(points)
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error(MADD, e))?;
        if timestamps.len() != points.len() {
            return Err(StoreError::Reply(format!(
                "{MADD} acknowledged {} of {} points",
                timestamps.len(),
                points.len()
            )));
        }
        Ok(())
    }

    #[instrument(name = "StoreRange", skip(self))]
    async fn range_average(
        &self,
        key: &str,
        from_ms: i64,
        to: RangeEnd,
        bucket_ms: u64,
    ) -> Result<Vec<Bucket>, StoreError> {
        let mut conn = self.conn.clone();
        let buckets: Vec<(i64, f64)> = range_cmd(key, from_ms, to, bucket_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error(RANGE, e))?;
        debug!(buckets = buckets.len(), "Range query returned");
        Ok(buckets)
    }
}

#[async_trait]
impl Cache<String, String> for RedisStore {
    async fn get(&self, key: &String) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error("GET", e))?;
        debug!(
            "Cache {} for key: {:?}",
            if value.is_some() { "HIT" } else { "MISS" },
            key
        );
        Ok(value)
    }

    async fn put(
        &self,
        key: String,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(&key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl.as_millis().max(1) as u64);
        }
        let _: () = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error("SET", e))?;
        debug!("Cache PUT for key: {:?}", key);
        Ok(())
    }
}
