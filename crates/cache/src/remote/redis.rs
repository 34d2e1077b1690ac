//! Redis-backed remote store.

use super::{MessageStream, RemoteStore};
use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use workshelf_core::{Error, Result};

/// How many keys one SCAN step asks for during prefix deletion.
const SCAN_BATCH: usize = 100;

/// Shared remote tier backed by Redis.
///
/// Request traffic goes through a multiplexed [`ConnectionManager`], which
/// reconnects on its own. Pub/sub subscriptions open a dedicated
/// connection instead, since `SUBSCRIBE` blocks its connection for the
/// lifetime of the subscription.
pub struct RedisStore {
    client: Client,
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to the store at `url` (e.g. `redis://host:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(|e| Error::Configuration {
            message: format!("invalid remote store url: {e}"),
        })?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::remote("connect", e))?;
        Ok(Self { client, manager })
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(|e| Error::remote("get", e))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.manager.clone();
        // SETEX rejects 0; a sub-second TTL still needs to expire.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| Error::remote("set", e))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::remote("delete", e))
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        let mut conn = self.manager.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::remote("scan", e))?;
            if !keys.is_empty() {
                removed += keys.len() as u64;
                conn.del::<_, ()>(keys)
                    .await
                    .map_err(|e| Error::remote("delete", e))?;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(removed)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.publish::<_, _, ()>(channel, payload)
            .await
            .map_err(|e| Error::remote("publish", e))
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageStream> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| Error::remote("subscribe", e))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| Error::remote("subscribe", e))?;
        // Undecodable payloads become empty strings, which the decoder
        // treats as a full clear rather than a dropped invalidation.
        let stream = pubsub
            .into_on_message()
            .map(|msg| msg.get_payload::<String>().unwrap_or_default());
        Ok(stream.boxed())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}
