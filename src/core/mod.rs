//! Core abstractions and types

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod log;
pub mod sample;
pub mod summary;
pub mod timeseries;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result, StoreError};
pub use keys::Keys;
pub use sample::Sample;
pub use summary::{AggregatedPoint, CacheEntry, Field, TrendDirection};
pub use timeseries::{Bucket, DataPoint, DuplicatePolicy, RangeEnd, TimeSeriesStore};
