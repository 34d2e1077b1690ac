//! Distributed per-user view cache for the workshelf catalog.
//!
//! ## Architecture
//!
//! - **Remote tier**: shared key/value store with TTL and pub/sub,
//!   reached through the [`RemoteStore`] trait ([`RedisStore`] in
//!   production, [`MemoryStore`] for single-node runs and tests).
//! - **Local tier**: per-replica bounded LRU map, the fast path and the
//!   fallback when the remote store is unreachable.
//! - **Invalidation bus**: one well-known pub/sub channel telling every
//!   replica "drop this user's cached view" or "drop everything".
//!
//! ## Graceful degradation
//!
//! No cache operation ever fails the caller. A remote outage degrades
//! reads and writes to the local tier, publishes become no-ops, and every
//! cached entry still expires by TTL, so a missed invalidation means
//! bounded staleness, never permanent staleness.

pub mod config;
pub mod invalidation;
pub mod keys;
pub mod local;
pub mod remote;
pub mod request_scope;
pub mod store;

pub use config::CacheSettings;
pub use invalidation::InvalidationBus;
pub use keys::user_view_key;
pub use remote::{memory::MemoryStore, redis::RedisStore, MessageStream, RemoteStore};
pub use request_scope::RequestScopedCache;
pub use store::CacheStore;
