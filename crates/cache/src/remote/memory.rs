//! In-process remote store.

use super::{MessageStream, RemoteStore};
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use workshelf_core::Result;

const CHANNEL_CAPACITY: usize = 64;

struct MemoryEntry {
    payload: String,
    expires_at: Instant,
}

struct MemoryInner {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

/// In-memory stand-in for the shared remote store.
///
/// Cloning yields handles onto the same underlying state, so several cache
/// instances built over clones of one `MemoryStore` behave like replicas
/// sharing one backing store. Used for single-node deployments without a
/// remote store and for multi-replica simulation in tests.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                entries: Mutex::new(HashMap::new()),
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        self.inner
            .channels
            .lock()
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.inner.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) => {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.payload.clone()));
                }
                true
            }
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.inner.entries.lock().insert(
            key.to_string(),
            MemoryEntry {
                payload: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.entries.lock().remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        // A send error only means nobody is subscribed right now.
        let _ = self.sender(channel).send(payload.to_string());
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageStream> {
        let receiver = self.sender(channel).subscribe();
        // Lagged receivers skip ahead; a dropped message is bounded by TTL
        // like any other missed invalidation.
        let stream = BroadcastStream::new(receiver).filter_map(|item| async move { item.ok() });
        Ok(stream.boxed())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.inner.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "v", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_by_prefix_counts_removals() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set_ex("a:1", "x", ttl).await.unwrap();
        store.set_ex("a:2", "x", ttl).await.unwrap();
        store.set_ex("b:1", "x", ttl).await.unwrap();

        assert_eq!(store.delete_by_prefix("a:").await.unwrap(), 2);
        assert_eq!(store.get("b:1").await.unwrap(), Some("x".to_string()));
    }

    #[tokio::test]
    async fn pubsub_reaches_all_subscribers() {
        let store = MemoryStore::new();
        let mut first = store.subscribe("ch").await.unwrap();
        let mut second = store.clone().subscribe("ch").await.unwrap();

        store.publish("ch", "hello").await.unwrap();

        assert_eq!(first.next().await, Some("hello".to_string()));
        assert_eq!(second.next().await, Some("hello".to_string()));
    }
}
