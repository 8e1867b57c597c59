use crate::core::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value storage with per-entry expiry.
///
/// Expired entries are indistinguishable from entries that were never written.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), StoreError>;
}
