//! Two-tier cache store: shared remote primary, local LRU fallback.

use crate::config::CacheSettings;
use crate::keys;
use crate::local::LocalCache;
use crate::remote::RemoteStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Best-effort key/value cache for per-user views.
///
/// Reads try the remote tier first and fall back to the local tier on a
/// remote error or miss; writes go through to the remote tier when
/// reachable and always land in the local tier. No operation ever
/// propagates a store failure: callers always have a correctness fallback
/// (recompute from the source of truth), so the worst case here is a miss.
///
/// Cancellation-safe: an abandoned `set` has either completed a tier write
/// or not started it, never left a partial one.
pub struct CacheStore {
    remote: Option<Arc<dyn RemoteStore>>,
    local: LocalCache,
    settings: CacheSettings,
}

impl CacheStore {
    /// Local-only store, for deployments without a remote tier.
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            local: LocalCache::new(settings.local_max_entries),
            remote: None,
            settings,
        }
    }

    /// Store backed by a shared remote tier.
    pub fn with_remote(settings: CacheSettings, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            local: LocalCache::new(settings.local_max_entries),
            remote: Some(remote),
            settings,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Key holding `user_id`'s view under this store's namespace.
    pub fn user_view_key(&self, user_id: &str) -> String {
        keys::user_view_key(&self.settings.key_prefix, user_id)
    }

    /// Fetch and deserialize a cached value. Malformed payloads are
    /// dropped and reported as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(Some(payload)) => match serde_json::from_str(&payload) {
                    Ok(value) => {
                        // Fast-path copy for the next read on this replica.
                        self.local
                            .insert(key.to_string(), payload, self.settings.entry_ttl);
                        return Some(value);
                    }
                    Err(error) => {
                        warn!(key, %error, "malformed remote cache payload; treating as miss");
                        if let Err(error) = remote.delete(key).await {
                            debug!(key, %error, "failed to drop malformed remote entry");
                        }
                        self.local.remove(key);
                        return None;
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    debug!(key, %error, "remote get failed; consulting local tier");
                }
            }
        }

        let payload = self.local.get(key)?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "malformed local cache payload; treating as miss");
                self.local.remove(key);
                None
            }
        }
    }

    /// Cache a value under the configured TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.settings.entry_ttl).await;
    }

    /// Cache a value with an explicit TTL. Write-through to the remote
    /// tier when reachable; the local tier is always updated.
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(key, %error, "failed to serialize cache value; skipping write");
                return;
            }
        };

        if let Some(remote) = &self.remote {
            if let Err(error) = remote.set_ex(key, &payload, ttl).await {
                warn!(key, %error, "remote set failed; value held in local tier only");
            }
        }
        self.local.insert(key.to_string(), payload, ttl);
    }

    /// Drop one key from both tiers.
    pub async fn delete(&self, key: &str) {
        if let Some(remote) = &self.remote {
            if let Err(error) = remote.delete(key).await {
                debug!(key, %error, "remote delete failed; entry expires by TTL");
            }
        }
        self.local.remove(key);
    }

    /// Drop every key under `prefix` from both tiers.
    pub async fn delete_by_prefix(&self, prefix: &str) {
        if let Some(remote) = &self.remote {
            match remote.delete_by_prefix(prefix).await {
                Ok(removed) => debug!(prefix, removed, "removed remote entries by prefix"),
                Err(error) => {
                    debug!(prefix, %error, "remote prefix delete failed; entries expire by TTL");
                }
            }
        }
        self.local.remove_by_prefix(prefix);
    }

    /// Drop everything under this store's namespace from both tiers.
    pub async fn clear(&self) {
        if let Some(remote) = &self.remote {
            match remote.delete_by_prefix(&self.settings.key_prefix).await {
                Ok(removed) => debug!(removed, "cleared remote cache namespace"),
                Err(error) => {
                    debug!(%error, "remote clear failed; entries expire by TTL");
                }
            }
        }
        self.local.clear();
    }

    /// Drop one key from the local tier only. Used when applying
    /// invalidations received from another replica, which already handled
    /// the remote tier.
    pub fn drop_local(&self, key: &str) {
        self.local.remove(key);
    }

    /// Empty the local tier only.
    pub fn clear_local(&self) {
        self.local.clear();
    }

    /// Whether the local tier holds a fresh copy of `key`.
    pub fn local_contains(&self, key: &str) -> bool {
        self.local.contains(key)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("remote", &self.remote.is_some())
            .field("local", &self.local)
            .field("key_prefix", &self.settings.key_prefix)
            .finish()
    }
}
