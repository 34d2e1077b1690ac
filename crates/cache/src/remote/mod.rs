//! Remote store abstraction shared by the cache and the invalidation bus.
//!
//! The remote store is the single source of cross-replica truth for both
//! caching and pub/sub. It is assumed to provide atomic per-key operations;
//! no client-side locking is layered on top.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;
use workshelf_core::Result;

/// Stream of raw payloads received on a pub/sub channel. Ends when the
/// underlying connection drops.
pub type MessageStream = BoxStream<'static, String>;

/// Shared key/value store with TTL plus a pub/sub facility.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every key under `prefix` incrementally, without a single
    /// blocking bulk operation on the shared store. Returns the number of
    /// keys removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64>;

    /// Fire a payload at every subscriber of `channel`.
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;

    /// Open a dedicated subscriber connection to `channel`.
    ///
    /// Subscribing ties up its connection for the lifetime of the stream,
    /// so implementations must never hand out a connection shared with
    /// request traffic.
    async fn subscribe(&self, channel: &str) -> Result<MessageStream>;
}
