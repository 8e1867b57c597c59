pub mod memory;
pub mod redis;
pub mod timeseries;

use crate::core::cache::Cache;
use crate::core::config::{StoreBackend, StoreConfig};
use crate::core::error::StoreError;
use crate::core::timeseries::TimeSeriesStore;
use memory::MemoryCache;
use self::redis::RedisStore;
use std::sync::Arc;
use timeseries::MemoryTimeSeries;
use tracing::info;

/// Shared handles to the time series and the cache slot storage.
#[derive(Clone)]
pub struct Stores {
    pub series: Arc<dyn TimeSeriesStore>,
    pub cache: Arc<dyn Cache<String, String>>,
}

impl Stores {
    /// Both halves kept in process memory.
    pub fn memory() -> Self {
        Self {
            series: Arc::new(MemoryTimeSeries::new()),
            cache: Arc::new(MemoryCache::<String, String>::new()),
        }
    }

    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Ok(Self::memory())
            }
            StoreBackend::Redis => {
                let store = Arc::new(RedisStore::connect(&config.url).await?);
                info!("Using redis store");
                Ok(Self {
                    series: store.clone(),
                    cache: store,
                })
            }
        }
    }
}
