//! Behavior while the remote store is unreachable.
//!
//! A flaky wrapper around `MemoryStore` flips between healthy and down, so
//! the same store instance can exercise degradation and recovery.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use workshelf_cache::{
    CacheSettings, CacheStore, InvalidationBus, MemoryStore, MessageStream, RemoteStore,
};
use workshelf_core::{Error, Invalidation, Result};

/// Remote store that can be taken offline at will.
struct FlakyStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl FlakyStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            down: AtomicBool::new(false),
        })
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(Error::remote(operation, "connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check("get")?;
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check("set")?;
        self.inner.set_ex(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check("delete")?;
        self.inner.delete(key).await
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        self.check("scan")?;
        self.inner.delete_by_prefix(prefix).await
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        self.check("publish")?;
        self.inner.publish(channel, payload).await
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageStream> {
        self.check("subscribe")?;
        self.inner.subscribe(channel).await
    }
}

#[tokio::test]
async fn operations_degrade_to_local_tier_while_remote_is_down() {
    let flaky = FlakyStore::new();
    let remote: Arc<dyn RemoteStore> = flaky.clone();
    let settings = CacheSettings::default();
    let store = CacheStore::with_remote(settings.clone(), remote.clone());
    let bus = InvalidationBus::new(Some(remote), &settings);

    flaky.set_down(true);

    // None of these may raise; set must land in the local tier.
    store.set("k", &7u32).await;
    assert_eq!(store.get::<u32>("k").await, Some(7));
    bus.publish(&Invalidation::All).await;
    store.delete("k").await;
    assert_eq!(store.get::<u32>("k").await, None);
}

#[tokio::test]
async fn entries_written_while_degraded_surface_after_recovery() {
    let flaky = FlakyStore::new();
    let store = CacheStore::with_remote(CacheSettings::default(), flaky.clone());

    flaky.set_down(true);
    store.set("k", &"local-only".to_string()).await;

    flaky.set_down(false);
    // The remote tier never saw the write; the local copy still serves.
    assert_eq!(
        store.get::<String>("k").await,
        Some("local-only".to_string())
    );
}

#[tokio::test]
async fn listener_reconnects_after_remote_recovery() {
    let flaky = FlakyStore::new();
    let remote: Arc<dyn RemoteStore> = flaky.clone();
    let settings = CacheSettings::default().with_reconnect_backoff(Duration::from_millis(20));
    let store = Arc::new(CacheStore::with_remote(settings.clone(), remote.clone()));
    let bus = InvalidationBus::new(Some(remote), &settings);

    flaky.set_down(true);
    let listener = bus.spawn_listener(store.clone()).unwrap();

    let key = store.user_view_key("u1");
    store.set(&key, &1u32).await;
    assert!(store.local_contains(&key));

    // Bring the remote back; the listener resubscribes within a few
    // backoff intervals and applies the next invalidation.
    flaky.set_down(false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    flaky
        .inner
        .publish(&settings.invalidation_channel, "all")
        .await
        .unwrap();

    let mut cleared = false;
    for _ in 0..100 {
        if !store.local_contains(&key) {
            cleared = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cleared, "listener did not recover and apply the invalidation");

    listener.abort();
}
