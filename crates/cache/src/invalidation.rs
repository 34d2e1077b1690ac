//! Cross-replica cache invalidation over the remote store's pub/sub.

use crate::config::CacheSettings;
use crate::remote::RemoteStore;
use crate::store::CacheStore;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use workshelf_core::Invalidation;

/// Publish/subscribe channel for "drop this user's cached view" messages.
///
/// Publishing is fire-and-forget: a failed publish is logged and the
/// triggering mutation proceeds, because every cached entry still expires
/// by TTL and the publishing replica has already dropped its own copies.
pub struct InvalidationBus {
    remote: Option<Arc<dyn RemoteStore>>,
    channel: String,
    backoff: Duration,
}

impl InvalidationBus {
    pub fn new(remote: Option<Arc<dyn RemoteStore>>, settings: &CacheSettings) -> Self {
        Self {
            remote,
            channel: settings.invalidation_channel.clone(),
            backoff: settings.reconnect_backoff,
        }
    }

    /// Tell every replica to drop the given entries. Never fails.
    pub async fn publish(&self, invalidation: &Invalidation) {
        let Some(remote) = &self.remote else {
            return;
        };
        let payload = invalidation.to_payload();
        if let Err(error) = remote.publish(&self.channel, &payload).await {
            debug!(
                channel = %self.channel,
                %error,
                "invalidation publish failed; other replicas converge via TTL"
            );
        }
    }

    /// Mutation-pipeline entry point: drop the affected entries from this
    /// replica's store (both tiers), then tell every other replica.
    pub async fn invalidate(&self, store: &CacheStore, invalidation: &Invalidation) {
        match invalidation {
            Invalidation::All => store.clear().await,
            Invalidation::Users(users) => {
                for user_id in users {
                    store.delete(&store.user_view_key(user_id)).await;
                }
            }
        }
        self.publish(invalidation).await;
    }

    /// Apply an invalidation received from another replica to the local
    /// tier. The publishing replica already handled the remote tier.
    pub fn apply(store: &CacheStore, invalidation: &Invalidation) {
        match invalidation {
            Invalidation::All => {
                store.clear_local();
                debug!("invalidation cleared local cache tier");
            }
            Invalidation::Users(users) => {
                for user_id in users {
                    store.drop_local(&store.user_view_key(user_id));
                }
                debug!(users = users.len(), "invalidation dropped local entries");
            }
        }
    }

    /// Spawn this replica's invalidation listener.
    ///
    /// One long-lived task subscribes on a dedicated connection and applies
    /// every received message to `store`'s local tier. On any connect or
    /// stream error it sleeps for the configured backoff and resubscribes;
    /// it never terminates on its own. Returns `None` when no remote store
    /// is configured, otherwise the task handle so the host can abort it
    /// on shutdown.
    pub fn spawn_listener(&self, store: Arc<CacheStore>) -> Option<JoinHandle<()>> {
        let remote = self.remote.clone()?;
        let channel = self.channel.clone();
        let backoff = self.backoff;
        Some(tokio::spawn(async move {
            loop {
                match remote.subscribe(&channel).await {
                    Ok(mut messages) => {
                        info!(channel = %channel, "invalidation listener subscribed");
                        while let Some(payload) = messages.next().await {
                            Self::apply(&store, &Invalidation::from_payload(&payload));
                        }
                        warn!(channel = %channel, "invalidation subscription ended; reconnecting");
                    }
                    Err(error) => {
                        warn!(channel = %channel, %error, "invalidation subscribe failed; retrying");
                    }
                }
                tokio::time::sleep(backoff).await;
            }
        }))
    }
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("channel", &self.channel)
            .field("backoff", &self.backoff)
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryStore;
    use std::collections::BTreeSet;

    fn store(remote: &MemoryStore) -> Arc<CacheStore> {
        Arc::new(CacheStore::with_remote(
            CacheSettings::default(),
            Arc::new(remote.clone()),
        ))
    }

    #[tokio::test]
    async fn apply_users_drops_only_those_local_entries() {
        let remote = MemoryStore::new();
        let store = store(&remote);
        store.set(&store.user_view_key("u1"), &1u32).await;
        store.set(&store.user_view_key("u2"), &2u32).await;

        InvalidationBus::apply(&store, &Invalidation::user("u1"));

        assert!(!store.local_contains(&store.user_view_key("u1")));
        assert!(store.local_contains(&store.user_view_key("u2")));
    }

    #[tokio::test]
    async fn apply_all_clears_local_tier() {
        let remote = MemoryStore::new();
        let store = store(&remote);
        store.set(&store.user_view_key("u1"), &1u32).await;

        InvalidationBus::apply(&store, &Invalidation::All);

        assert!(!store.local_contains(&store.user_view_key("u1")));
    }

    #[tokio::test]
    async fn invalidate_removes_remote_entries_and_publishes() {
        let remote = MemoryStore::new();
        let store = store(&remote);
        let settings = CacheSettings::default();
        let shared: Arc<dyn RemoteStore> = Arc::new(remote.clone());
        let bus = InvalidationBus::new(Some(shared), &settings);

        let mut messages = remote
            .subscribe(&settings.invalidation_channel)
            .await
            .unwrap();

        store.set(&store.user_view_key("u1"), &1u32).await;
        bus.invalidate(&store, &Invalidation::user("u1")).await;

        assert_eq!(
            store.get::<u32>(&store.user_view_key("u1")).await,
            None
        );
        let payload = messages.next().await.unwrap();
        assert_eq!(
            Invalidation::from_payload(&payload),
            Invalidation::Users(BTreeSet::from(["u1".to_string()]))
        );
    }

    #[tokio::test]
    async fn publish_without_remote_is_a_no_op() {
        let settings = CacheSettings::default();
        let bus = InvalidationBus::new(None, &settings);
        bus.publish(&Invalidation::All).await;
        assert!(bus.spawn_listener(store(&MemoryStore::new())).is_none());
    }
}
