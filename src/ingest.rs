//! Writes sample batches into the price and sentiment series

use crate::core::error::Result;
use crate::core::{DataPoint, DuplicatePolicy, Keys, Sample, StoreError, TimeSeriesStore};
use tracing::{debug, instrument};

/// Creates both series with duplicate policy `first`.
///
/// A series that already exists is expected on every start after the first;
/// the store's rejection is logged and ignored. Transport failures still surface.
pub async fn initialize_series(
    store: &dyn TimeSeriesStore,
    keys: &Keys,
) -> std::result::Result<(), StoreError> {
    for key in [keys.sentiment(), keys.price()] {
        match store.create_series(&key, DuplicatePolicy::First).await {
            Ok(()) => debug!("Created timeseries {}", key),
            Err(e @ StoreError::Connection(_)) => return Err(e),
            Err(e) => debug!("Could not create timeseries {}, error: {}", key, e),
        }
    }
    Ok(())
}

/// Flattens `samples` into one point per (sample, series) pair, in sample order.
pub fn data_points(keys: &Keys, samples: &[Sample]) -> Result<Vec<DataPoint>> {
    let (price_key, sentiment_key) = (keys.price(), keys.sentiment());
    let mut points = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let timestamp_ms = sample.timestamp_ms();
        points.push(DataPoint::new(&price_key, timestamp_ms, sample.price()?));
        points.push(DataPoint::new(&sentiment_key, timestamp_ms, sample.mean));
    }
    Ok(points)
}

/// Appends every sample in a single multi-point write.
///
/// Re-ingesting a sample is harmless: the series keep the first value written
/// at each timestamp, so no deduplication happens here.
#[instrument(skip_all, fields(samples = samples.len()))]
pub async fn persist(store: &dyn TimeSeriesStore, keys: &Keys, samples: &[Sample]) -> Result<()> {
    let points = data_points(keys, samples)?;
    if points.is_empty() {
        debug!("No samples to persist");
        return Ok(());
    }
    store.append_many(&points).await?;
    debug!(points = points.len(), "Persisted samples");
    Ok(())
}
