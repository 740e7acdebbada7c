// ============================================================================
// INVOICE CACHE - cache-aside layer for filtered invoice queries
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::store::{CacheError, CacheStore};
use crate::cache_key;

/// TTL'd string-payload cache over the shared key-value store.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// A missing or expired key is `Ok(None)`; `Err` means the store is
    /// degraded, not that the entry is absent.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.store.get(key).await
    }

    pub async fn set(&self, key: &str, payload: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.store.set_ex(key, payload, ttl_seconds).await
    }

    /// Best-effort bulk removal; deleting an unknown key is a no-op.
    pub async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        self.store.del(keys).await
    }
}

/// Tracks every key written under a namespace so the whole namespace can be
/// purged in one sweep when the underlying data mutates.
#[derive(Clone)]
pub struct InvalidationIndex {
    store: Arc<dyn CacheStore>,
}

impl InvalidationIndex {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Add `key` to the namespace's index set. Idempotent; safe under
    /// concurrent registrations for the same namespace.
    pub async fn register(&self, namespace: &str, key: &str) -> Result<(), CacheError> {
        self.store
            .sadd(&cache_key::namespace_index(namespace), key)
            .await
    }

    /// Return the namespace's full member set and remove the index entry, so
    /// the next registration starts a fresh set instead of resurrecting
    /// already-invalidated keys.
    ///
    /// An unreachable store is an `Err`, never an empty set: reporting
    /// "nothing to invalidate" here would silently leave stale results in
    /// place until their TTL runs out.
    pub async fn drain_and_clear(&self, namespace: &str) -> Result<Vec<String>, CacheError> {
        self.store
            .drain_set(&cache_key::namespace_index(namespace))
            .await
    }
}

/// Orchestrates read-through population and mutation-triggered invalidation
/// of the filtered-invoice namespace.
#[derive(Clone)]
pub struct InvoiceCacheCoordinator {
    cache: ResultCache,
    index: InvalidationIndex,
}

impl InvoiceCacheCoordinator {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            cache: ResultCache::new(store.clone()),
            index: InvalidationIndex::new(store),
        }
    }

    /// Serve `key` from the cache, or run `loader` and populate.
    ///
    /// Returns the value plus whether it came from the cache. Loader
    /// failures propagate untouched and nothing is cached for them. Cache
    /// failures never fail the request: a degraded read falls back to the
    /// loader, a failed write is logged and skipped.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        ttl_seconds: u64,
        loader: F,
    ) -> Result<(T, bool), E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.cache.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    return Ok((value, true));
                }
                Err(e) => warn!(key, error = %e, "discarding undecodable cache entry"),
            },
            Ok(None) => debug!(key, "cache miss"),
            Err(e) => warn!(key, error = %e, "cache read degraded, falling back to store"),
        }

        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(payload) => {
                if let Err(e) = self.cache.set(key, &payload, ttl_seconds).await {
                    warn!(key, error = %e, "failed to populate cache");
                } else if let Err(e) = self.index.register(namespace, key).await {
                    // The entry still expires via TTL, it just cannot be
                    // purged early by the next mutation.
                    warn!(key, namespace, error = %e, "failed to index cache key");
                }
            }
            Err(e) => warn!(key, error = %e, "failed to serialize value for caching"),
        }

        Ok((value, false))
    }

    /// Purge every cached entry registered under `namespace`.
    ///
    /// Called synchronously after each successful mutation, before the
    /// mutation's result is returned to the client. Failures are surfaced as
    /// warnings and never fail the mutation; the entry TTL bounds how long
    /// stale results can outlive a failed invalidation.
    pub async fn invalidate_namespace(&self, namespace: &str) {
        let keys = match self.index.drain_and_clear(namespace).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(namespace, error = %e, "cache invalidation skipped: index drain failed");
                return;
            }
        };

        if keys.is_empty() {
            debug!(namespace, "no cached entries to invalidate");
            return;
        }

        match self.cache.delete(&keys).await {
            Ok(()) => debug!(namespace, count = keys.len(), "invalidated cached query results"),
            Err(e) => {
                warn!(namespace, error = %e, "cache invalidation incomplete: bulk delete failed")
            }
        }
    }
}
