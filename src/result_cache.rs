//! Single-slot, expiring memo of the last computed summary

use crate::core::{Cache, CacheEntry, Keys, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const PAYLOAD_VERSION: u32 = 1;

/// On-store encoding. Instants are typed fields and decode as RFC 3339.
#[derive(Serialize, Deserialize)]
struct Payload<T> {
    version: u32,
    entry: T,
}

pub fn encode(entry: &CacheEntry) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&Payload {
        version: PAYLOAD_VERSION,
        entry,
    })?)
}

/// `Ok(None)` for a payload written under another version.
pub fn decode(raw: &str) -> Result<Option<CacheEntry>, StoreError> {
    let payload: Payload<serde_json::Value> = serde_json::from_str(raw)?;
    if payload.version != PAYLOAD_VERSION {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(payload.entry)?))
}

#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn Cache<String, String>>,
    key: String,
}

impl ResultCache {
    pub fn new(store: Arc<dyn Cache<String, String>>, keys: &Keys) -> Self {
        Self {
            store,
            key: keys.cache(),
        }
    }

    /// The cached entry, or `None` when absent, expired or unreadable.
    pub async fn get(&self) -> Option<CacheEntry> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };
        match decode(&raw) {
            Ok(Some(entry)) => Some(entry),
            Ok(None) => {
                debug!("Cached payload has another version, treating as miss");
                None
            }
            Err(e) => {
                warn!(error = %e, "Cached payload is malformed, treating as miss");
                None
            }
        }
    }

    /// Overwrites the slot with `entry`, readable for `ttl`.
    pub async fn set(&self, entry: &CacheEntry, ttl: Duration) -> Result<(), StoreError> {
        let raw = encode(entry)?;
        self.store.put(self.key.clone(), raw, Some(ttl)).await
    }
}
