use async_trait::async_trait;
use btc_sentiment_cache::core::config::{PairingMode, WindowConfig};
use btc_sentiment_cache::core::{
    Bucket, Cache, CacheEntry, DataPoint, DuplicatePolicy, Error, FixedClock, Keys, RangeEnd,
    Sample, StoreError, TimeSeriesStore, TrendDirection,
};
use btc_sentiment_cache::result_cache::ResultCache;
use btc_sentiment_cache::service::SentimentService;
use btc_sentiment_cache::store::Stores;
use btc_sentiment_cache::store::memory::MemoryCache;
use btc_sentiment_cache::store::timeseries::MemoryTimeSeries;
use chrono::DateTime;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

// Counts calls into the wrapped store
mod test_utils {
    use super::*;

    #[derive(Default)]
    pub struct CountingStore {
        pub inner: MemoryTimeSeries,
        pub creates: AtomicUsize,
        pub ranges: AtomicUsize,
    }

    #[async_trait]
    impl TimeSeriesStore for CountingStore {
        async fn create_series(
            &self,
            key: &str,
            policy: DuplicatePolicy,
        ) -> Result<(), StoreError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create_series(key, policy).await
        }

        async fn append_many(&self, points: &[DataPoint]) -> Result<(), StoreError> {
            self.inner.append_many(points).await
        }

        async fn range_average(
            &self,
            key: &str,
            from_ms: i64,
            to: RangeEnd,
            bucket_ms: u64,
        ) -> Result<Vec<Bucket>, StoreError> {
            self.ranges.fetch_add(1, Ordering::SeqCst);
            self.inner.range_average(key, from_ms, to, bucket_ms).await
        }
    }

    pub struct RejectingCache;

    #[async_trait]
    impl Cache<String, String> for RejectingCache {
        async fn get(&self, _key: &String) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn put(
            &self,
            _key: String,
            _value: String,
            _ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            Err(StoreError::command("SET", "OOM command not allowed"))
        }
    }

    pub fn samples() -> Vec<Sample> {
        vec![
            Sample::new(1000.0, 0.5, "20000.00"),
            Sample::new(1060.0, 0.6, "20100.00"),
        ]
    }

    pub fn service(
        series: Arc<dyn TimeSeriesStore>,
        cache: Arc<dyn Cache<String, String>>,
        ttl: Duration,
    ) -> SentimentService {
        let window = WindowConfig {
            lookback_secs: 3600,
            bucket_ms: 60_000,
            pairing: PairingMode::Positional,
        };
        let clock = FixedClock(DateTime::from_timestamp(2000, 0).unwrap());
        let (service, _handle) = SentimentService::new(
            Stores { series, cache },
            Keys::default(),
            window,
            ttl,
            Arc::new(clock),
        );
        service
    }
}

use test_utils::{CountingStore, RejectingCache, samples, service};

#[test_log::test(tokio::test)]
async fn test_refresh_scenario() {
    let series = Arc::new(MemoryTimeSeries::new());
    let service = service(
        series.clone(),
        Arc::new(MemoryCache::<String, String>::new()),
        Duration::from_secs(120),
    );
    service.initialize().await.unwrap();

    let entry = service.refresh(&samples()).await.unwrap();
    info!(?entry, "Refreshed");

    // One bucket spanning both samples
    let sentiment = series
        .range_average(&Keys::default().sentiment(), 0, RangeEnd::Latest, 3_600_000)
        .await
        .unwrap();
    assert_eq!(sentiment.len(), 1);
    assert!((sentiment[0].1 - 0.55).abs() < 1e-9);

    assert_eq!(entry.hourly_average_of_averages.len(), 2);
    assert_eq!(entry.price_direction, TrendDirection::Rising);
    assert_eq!(entry.sentiment_direction, TrendDirection::Rising);
    assert_eq!(entry.hourly_average_of_averages[0].price, 20000.0);
}

#[test_log::test(tokio::test)]
async fn test_read_or_compute_hits_cache_within_ttl() {
    let series = Arc::new(CountingStore::default());
    let service = service(
        series.clone(),
        Arc::new(MemoryCache::<String, String>::new()),
        Duration::from_secs(120),
    );
    service.initialize().await.unwrap();
    btc_sentiment_cache::ingest::persist(series.as_ref(), service.keys(), &samples())
        .await
        .unwrap();

    let first = service.read_or_compute().await.unwrap();
    assert_eq!(series.ranges.load(Ordering::SeqCst), 2);

    service.writer().flush().await;
    let second = service.read_or_compute().await.unwrap();

    // One range query per series, all from the first call
    assert_eq!(series.ranges.load(Ordering::SeqCst), 2);
    assert_eq!(first, second);
}

#[test_log::test(tokio::test)]
async fn test_read_or_compute_recomputes_after_expiry() {
    let series = Arc::new(CountingStore::default());
    let service = service(
        series.clone(),
        Arc::new(MemoryCache::<String, String>::new()),
        Duration::from_millis(10),
    );
    service.initialize().await.unwrap();

    service.read_or_compute().await.unwrap();
    service.writer().flush().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    service.read_or_compute().await.unwrap();

    assert_eq!(series.ranges.load(Ordering::SeqCst), 4);
}

#[test_log::test(tokio::test)]
async fn test_refresh_result_is_served_from_cache() {
    let series = Arc::new(CountingStore::default());
    let service = service(
        series.clone(),
        Arc::new(MemoryCache::<String, String>::new()),
        Duration::from_secs(120),
    );
    service.initialize().await.unwrap();

    let refreshed = service.refresh(&samples()).await.unwrap();
    service.writer().flush().await;
    let read = service.read_or_compute().await.unwrap();

    assert_eq!(refreshed, read);
    assert_eq!(series.ranges.load(Ordering::SeqCst), 2);
}

#[test_log::test(tokio::test)]
async fn test_double_create_is_absorbed() {
    let series = Arc::new(CountingStore::default());
    let service = service(
        series.clone(),
        Arc::new(MemoryCache::<String, String>::new()),
        Duration::from_secs(120),
    );

    service.initialize().await.unwrap();
    service.initialize().await.unwrap();
    assert_eq!(series.creates.load(Ordering::SeqCst), 4);

    let entry = service.refresh(&samples()).await.unwrap();
    assert_eq!(entry.hourly_average_of_averages.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_refresh_surfaces_ingestion_failure() {
    // Series never created, so the append is rejected
    let service = service(
        Arc::new(MemoryTimeSeries::new()),
        Arc::new(MemoryCache::<String, String>::new()),
        Duration::from_secs(120),
    );

    let err = service.refresh(&samples()).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Command { .. })));
}

#[test_log::test(tokio::test)]
async fn test_cache_write_failure_does_not_reach_caller() {
    let service = service(
        Arc::new(MemoryTimeSeries::new()),
        Arc::new(RejectingCache),
        Duration::from_secs(120),
    );
    service.initialize().await.unwrap();

    let entry = service.refresh(&samples()).await.unwrap();
    service.writer().flush().await;
    let again = service.read_or_compute().await.unwrap();

    assert_eq!(entry, again);
}

#[test_log::test(tokio::test)]
async fn test_concurrent_cold_reads_converge() {
    let series = Arc::new(CountingStore::default());
    let cache = Arc::new(MemoryCache::<String, String>::new());
    let service = Arc::new(service(
        series.clone(),
        cache.clone(),
        Duration::from_secs(120),
    ));
    service.initialize().await.unwrap();
    btc_sentiment_cache::ingest::persist(series.as_ref(), service.keys(), &samples())
        .await
        .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.read_or_compute().await.unwrap() })
        })
        .collect();

    let mut results: Vec<CacheEntry> = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    // Each reader either hit the slot or ran one price and one sentiment range
    let ranges = series.ranges.load(Ordering::SeqCst);
    assert!((2..=16).contains(&ranges) && ranges % 2 == 0, "{ranges}");

    service.writer().flush().await;
    let slot = ResultCache::new(cache, &Keys::default()).get().await;
    assert_eq!(slot, Some(results[0].clone()));
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_memory_backend() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = r#"
        store:
          backend: memory
        key_prefix: "it"
        cache_ttl_secs: 120
        window:
          lookback_secs: 315360000
          bucket_ms: 60000
    "#;
    fs::write(config_file.path(), config_content).expect("Failed to write config file");

    let samples_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let samples_json = r#"[
        {"last": 0.4, "rate": 0.0, "mean": 0.5, "median": 0.5, "sum": 10.0, "count": 20,
         "timestamp": 1700000000.0, "btc_price": "36000.10"},
        {"last": 0.6, "rate": 0.0, "mean": 0.4, "median": 0.4, "sum": 8.0, "count": 20,
         "timestamp": 1700000060.0, "btc_price": "36050.00"}
    ]"#;
    fs::write(samples_file.path(), samples_json).expect("Failed to write samples file");

    let result = btc_sentiment_cache::run_command(
        btc_sentiment_cache::AppCommand::Refresh {
            samples: samples_file.path().to_path_buf(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Refresh failed with: {:?}", result.err());

    let output = result.unwrap().expect("Refresh should print the summary");
    let entry: CacheEntry = serde_json::from_str(&output).unwrap();
    assert_eq!(entry.hourly_average_of_averages.len(), 2);
    assert_eq!(entry.price_direction, TrendDirection::Rising);
    assert_eq!(entry.sentiment_direction, TrendDirection::Falling);
}

#[test_log::test(tokio::test)]
async fn test_run_command_with_bad_samples_file() {
    let config_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        config_file.path(),
        "store:\n  backend: memory\nwindow:\n  lookback_secs: 60\n  bucket_ms: 1000\n",
    )
    .unwrap();
    let samples_file = tempfile::NamedTempFile::new().unwrap();
    fs::write(samples_file.path(), "not json").unwrap();

    let result = btc_sentiment_cache::run_command(
        btc_sentiment_cache::AppCommand::Refresh {
            samples: samples_file.path().to_path_buf(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to parse samples file"));
}

#[test_log::test(tokio::test)]
#[ignore = "needs a Redis server with the TimeSeries module at REDIS_URL"]
async fn test_real_redis_round_trip() {
    use btc_sentiment_cache::store::redis::RedisStore;

    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".into());
    let store = Arc::new(RedisStore::connect(&url).await.unwrap());
    let prefix = format!("it-{}", std::process::id());

    let window = WindowConfig {
        lookback_secs: 60 * 60 * 24 * 365 * 60,
        bucket_ms: 60_000,
        pairing: PairingMode::Positional,
    };
    let (service, handle) = SentimentService::new(
        Stores {
            series: store.clone(),
            cache: store.clone(),
        },
        Keys::new(prefix),
        window,
        Duration::from_secs(5),
        Arc::new(FixedClock(chrono::Utc::now())),
    );
    service.initialize().await.unwrap();
    service.initialize().await.unwrap();

    let entry = service.refresh(&samples()).await.unwrap();
    assert_eq!(entry.price_direction, TrendDirection::Rising);

    drop(service);
    handle.await.unwrap();

    let cached = store
        .get(&format!("it-{}:cache", std::process::id()))
        .await
        .unwrap();
    assert!(cached.is_some());
}
