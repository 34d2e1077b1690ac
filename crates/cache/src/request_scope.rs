//! Request-local view resolution.

use crate::store::CacheStore;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use workshelf_core::UserView;

/// Holds one user's resolved view for the lifetime of a single request.
///
/// Two logically sequential reads within one request must not observe
/// different views when a concurrent mutation invalidates the store in
/// between: the first resolution wins and later reads reuse it. This is
/// read-your-own-resolution within a request, not global consistency.
/// The cell holds nothing beyond the request's lifetime and needs no
/// locking beyond what the request's execution context provides.
#[derive(Debug, Default)]
pub struct RequestScopedCache {
    view: OnceCell<Arc<UserView>>,
}

impl RequestScopedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the user's view once for this request.
    ///
    /// The first call consults the cache store and, on a full miss, runs
    /// `load` (the catalog assembler's recompute) and writes the result
    /// back for future requests. Every later call returns the already
    /// resolved view without touching the store.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        store: &CacheStore,
        user_id: &str,
        load: F,
    ) -> Arc<UserView>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = UserView>,
    {
        self.view
            .get_or_init(|| async {
                let key = store.user_view_key(user_id);
                if let Some(view) = store.get::<UserView>(&key).await {
                    return Arc::new(view);
                }
                let view = load().await;
                store.set(&key, &view).await;
                Arc::new(view)
            })
            .await
            .clone()
    }

    /// The view resolved earlier in this request, if any.
    pub fn resolved(&self) -> Option<Arc<UserView>> {
        self.view.get().cloned()
    }
}
