//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

/// Settings for the two-tier per-user view cache.
///
/// All policy knobs live here; nothing is hardcoded at call sites.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Remote store URL (e.g. `redis://host:6379`). `None` runs local-only.
    pub remote_url: Option<String>,
    /// Namespace prepended to every cache key.
    pub key_prefix: String,
    /// Logical TTL for cached views.
    pub entry_ttl: Duration,
    /// Bound on the local tier's entry count; LRU beyond it.
    pub local_max_entries: NonZeroUsize,
    /// Pub/sub channel carrying invalidation messages.
    pub invalidation_channel: String,
    /// Delay between invalidation listener reconnect attempts.
    pub reconnect_backoff: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            remote_url: None,
            key_prefix: "workshelf:cache:".to_string(),
            entry_ttl: Duration::from_secs(300),
            local_max_entries: NonZeroUsize::new(1000).expect("non-zero constant"),
            invalidation_channel: "workshelf:models:invalidate".to_string(),
            reconnect_backoff: Duration::from_secs(10),
        }
    }
}

impl CacheSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_entry_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }

    pub fn with_local_max_entries(mut self, max: NonZeroUsize) -> Self {
        self.local_max_entries = max;
        self
    }

    pub fn with_invalidation_channel(mut self, channel: impl Into<String>) -> Self {
        self.invalidation_channel = channel.into();
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }
}
