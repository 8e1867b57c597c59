//! Windowed price/sentiment averages and their trend

use crate::core::config::{PairingMode, WindowConfig};
use crate::core::{
    AggregatedPoint, Bucket, CacheEntry, Clock, Keys, RangeEnd, StoreError, TimeSeriesStore,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::{debug, instrument};

fn bucket_time(timestamp_ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .ok_or_else(|| StoreError::Reply(format!("bucket timestamp {timestamp_ms} out of range")))
}

/// Zips by index. The shorter sequence decides the length; time comes from `price`.
pub fn pair_positional(
    price: &[Bucket],
    sentiment: &[Bucket],
) -> Result<Vec<AggregatedPoint>, StoreError> {
    price
        .iter()
        .zip(sentiment)
        .map(|(&(ts, price), &(_, sentiment))| {
            Ok(AggregatedPoint {
                time: bucket_time(ts)?,
                price,
                sentiment,
            })
        })
        .collect()
}

/// Joins on equal bucket start. Both inputs must be ascending.
pub fn pair_by_timestamp(
    price: &[Bucket],
    sentiment: &[Bucket],
) -> Result<Vec<AggregatedPoint>, StoreError> {
    let mut points = Vec::with_capacity(price.len().min(sentiment.len()));
    let (mut p, mut s) = (price.iter().peekable(), sentiment.iter().peekable());
    while let (Some(&&(pt, pv)), Some(&&(st, sv))) = (p.peek(), s.peek()) {
        match pt.cmp(&st) {
            Ordering::Less => {
                p.next();
            }
            Ordering::Greater => {
                s.next();
            }
            Ordering::Equal => {
                points.push(AggregatedPoint {
                    time: bucket_time(pt)?,
                    price: pv,
                    sentiment: sv,
                });
                p.next();
                s.next();
            }
        }
    }
    Ok(points)
}

pub fn pair(
    mode: PairingMode,
    price: &[Bucket],
    sentiment: &[Bucket],
) -> Result<Vec<AggregatedPoint>, StoreError> {
    if price.len() != sentiment.len() {
        debug!(
            price = price.len(),
            sentiment = sentiment.len(),
            ?mode,
            "Bucket counts differ"
        );
    }
    match mode {
        PairingMode::Positional => pair_positional(price, sentiment),
        PairingMode::Timestamp => pair_by_timestamp(price, sentiment),
    }
}

/// Averages both series over the lookback window ending now. A window
/// reaching past the epoch starts at 0, the earliest timestamp a series holds.
#[instrument(skip_all, fields(lookback_secs = window.lookback_secs, bucket_ms = window.bucket_ms))]
pub async fn compute_window(
    store: &dyn TimeSeriesStore,
    keys: &Keys,
    window: &WindowConfig,
    clock: &dyn Clock,
) -> Result<CacheEntry, StoreError> {
    let start_ms = window
        .lookback()
        .and_then(|lookback| clock.now().checked_sub_signed(lookback))
        .map_or(0, |start| start.timestamp_millis().max(0));

    let price = store
        .range_average(&keys.price(), start_ms, RangeEnd::Latest, window.bucket_ms)
        .await?;
    let sentiment = store
        .range_average(&keys.sentiment(), start_ms, RangeEnd::Latest, window.bucket_ms)
        .await?;

    let points = pair(window.pairing, &price, &sentiment)?;
    let entry = CacheEntry::from_points(points);
    debug!(
        points = entry.hourly_average_of_averages.len(),
        price = %entry.price_direction,
        sentiment = %entry.sentiment_direction,
        "Computed window"
    );
    Ok(entry)
}
