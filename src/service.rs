//! Entry points handed to the request layer

use crate::aggregate::compute_window;
use crate::core::config::{AppConfig, WindowConfig};
use crate::core::error::Result;
use crate::core::{CacheEntry, Clock, Keys, Sample, StoreError, SystemClock, TimeSeriesStore};
use crate::ingest::{initialize_series, persist};
use crate::result_cache::ResultCache;
use crate::store::Stores;
use crate::writer::CacheWriter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

pub struct SentimentService {
    keys: Keys,
    series: Arc<dyn TimeSeriesStore>,
    cache: ResultCache,
    writer: CacheWriter,
    window: WindowConfig,
    clock: Arc<dyn Clock>,
}

impl SentimentService {
    /// Builds the service and spawns its cache writer on the current runtime.
    pub fn new(
        stores: Stores,
        keys: Keys,
        window: WindowConfig,
        cache_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> (Self, JoinHandle<()>) {
        let cache = ResultCache::new(stores.cache, &keys);
        let (writer, handle) = CacheWriter::spawn(cache.clone(), cache_ttl);
        let service = Self {
            keys,
            series: stores.series,
            cache,
            writer,
            window,
            clock,
        };
        (service, handle)
    }

    pub fn from_config(stores: Stores, config: &AppConfig) -> (Self, JoinHandle<()>) {
        Self::new(
            stores,
            Keys::new(config.key_prefix.clone()),
            config.window.clone(),
            config.cache_ttl(),
            Arc::new(SystemClock),
        )
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    pub fn writer(&self) -> &CacheWriter {
        &self.writer
    }

    /// Creates the price and sentiment series if they do not exist yet.
    pub async fn initialize(&self) -> std::result::Result<(), StoreError> {
        initialize_series(self.series.as_ref(), &self.keys).await
    }

    /// Ingests `samples`, recomputes the window and returns it.
    /// The cache is updated in the background.
    #[instrument(skip_all, fields(samples = samples.len()))]
    pub async fn refresh(&self, samples: &[Sample]) -> Result<CacheEntry> {
        persist(self.series.as_ref(), &self.keys, samples).await?;
        let entry = self.compute().await?;
        info!(
            points = entry.hourly_average_of_averages.len(),
            price = %entry.price_direction,
            sentiment = %entry.sentiment_direction,
            "Refreshed"
        );
        self.writer.schedule(entry.clone());
        Ok(entry)
    }

    /// Serves the cached entry, computing and caching it on a miss.
    #[instrument(skip_all)]
    pub async fn read_or_compute(&self) -> Result<CacheEntry> {
        if let Some(entry) = self.cache.get().await {
            debug!("Serving cached summary");
            return Ok(entry);
        }
        debug!("Cache miss, computing summary");
        let entry = self.compute().await?;
        self.writer.schedule(entry.clone());
        Ok(entry)
    }

    async fn compute(&self) -> std::result::Result<CacheEntry, StoreError> {
        compute_window(
            self.series.as_ref(),
            &self.keys,
            &self.window,
            self.clock.as_ref(),
        )
        .await
    }
}
