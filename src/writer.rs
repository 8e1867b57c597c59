//! Background worker for deferred cache writes

use crate::core::CacheEntry;
use crate::result_cache::ResultCache;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

enum Message {
    Write(CacheEntry),
    Flush(oneshot::Sender<()>),
}

/// Handle for scheduling cache writes off the request path.
///
/// Writes are applied in the order they were scheduled. The worker stops once
/// every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct CacheWriter {
    tx: mpsc::UnboundedSender<Message>,
}

impl CacheWriter {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(cache: ResultCache, ttl: Duration) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Write(entry) => match cache.set(&entry, ttl).await {
                        Ok(()) => debug!("Deferred cache write done"),
                        Err(e) => warn!(error = %e, "Deferred cache write failed"),
                    },
                    Message::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Cache writer stopped");
        });
        (Self { tx }, handle)
    }

    /// Queues `entry` for writing and returns immediately.
    pub fn schedule(&self, entry: CacheEntry) {
        if self.tx.send(Message::Write(entry)).is_err() {
            warn!("Cache writer is gone, dropping cache write");
        }
    }

    /// Waits until every write scheduled before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Message::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }
}
