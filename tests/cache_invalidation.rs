// Integration tests for the cache-aside layer: read-through population,
// namespace invalidation, TTL expiry, and failure reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use invoice_dashboard_ws::cache::{
    CacheError, CacheStore, InvalidationIndex, InvoiceCacheCoordinator, MemoryCacheStore,
    ResultCache,
};
use invoice_dashboard_ws::cache_key;
use invoice_dashboard_ws::cache_ttl::TTL_FILTERED_INVOICES;
use invoice_dashboard_ws::models::InvoiceSearchRow;

const NS: &str = cache_key::FILTERED_INVOICES_NS;

fn row(name: &str, amount_cents: i64) -> InvoiceSearchRow {
    InvoiceSearchRow {
        id: Uuid::new_v4(),
        amount: Decimal::new(amount_cents, 2),
        date: NaiveDate::from_ymd_opt(2025, 5, 15).unwrap(),
        status: "pending".to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name),
        image_url: format!("/customers/{}.png", name),
    }
}

/// Store double whose every operation fails, standing in for an
/// unreachable cache backend.
struct UnreachableStore;

#[async_trait]
impl CacheStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Timeout(Duration::from_secs(2)))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_secs(2)))
    }

    async fn del(&self, _keys: &[String]) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_secs(2)))
    }

    async fn sadd(&self, _set_key: &str, _member: &str) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_secs(2)))
    }

    async fn drain_set(&self, _set_key: &str) -> Result<Vec<String>, CacheError> {
        Err(CacheError::Timeout(Duration::from_secs(2)))
    }
}

#[tokio::test]
async fn miss_then_populate_invokes_loader_once_and_stores_exact_payload() {
    let store = Arc::new(MemoryCacheStore::new());
    let coordinator = InvoiceCacheCoordinator::new(store.clone() as Arc<dyn CacheStore>);

    let rows = vec![row("alice", 10700), row("bob", 250)];
    let calls = AtomicUsize::new(0);
    let key = cache_key::filtered_invoices("", 1, 6);

    let (loaded, cached) = coordinator
        .read_through(NS, &key, TTL_FILTERED_INVOICES, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(rows.clone())
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!cached);
    assert_eq!(loaded, rows);

    // The cached payload must be exactly the serialized loader result.
    let cache = ResultCache::new(store as Arc<dyn CacheStore>);
    let payload = cache.get(&key).await.unwrap().expect("entry should exist");
    assert_eq!(payload, serde_json::to_string(&rows).unwrap());
}

#[tokio::test]
async fn second_identical_read_hits_cache_without_loader() {
    let store = Arc::new(MemoryCacheStore::new());
    let coordinator = InvoiceCacheCoordinator::new(store as Arc<dyn CacheStore>);

    let rows = vec![row("alice", 10700)];
    let calls = AtomicUsize::new(0);
    let key = cache_key::filtered_invoices("alice", 1, 6);

    let load = || {
        calls.fetch_add(1, Ordering::SeqCst);
        rows.clone()
    };

    let (first, first_cached) = coordinator
        .read_through(NS, &key, TTL_FILTERED_INVOICES, || async {
            Ok::<_, String>(load())
        })
        .await
        .unwrap();
    let (second, second_cached) = coordinator
        .read_through(NS, &key, TTL_FILTERED_INVOICES, || async {
            Ok::<_, String>(load())
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!first_cached);
    assert!(second_cached);
    assert_eq!(first, second);
}

#[tokio::test]
async fn invalidation_purges_every_registered_key() {
    let store = Arc::new(MemoryCacheStore::new());
    let coordinator = InvoiceCacheCoordinator::new(store as Arc<dyn CacheStore>);

    let pre_mutation = vec![row("alice", 10700)];
    let post_mutation = vec![row("alice", 10700), row("carol", 9900)];
    let list_key = cache_key::filtered_invoices("", 1, 6);
    let count_key = cache_key::invoice_count("");
    let calls = AtomicUsize::new(0);

    coordinator
        .read_through(NS, &list_key, TTL_FILTERED_INVOICES, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(pre_mutation.clone())
        })
        .await
        .unwrap();
    coordinator
        .read_through(NS, &count_key, TTL_FILTERED_INVOICES, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(1i64)
        })
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // A mutation lands, then invalidates the whole namespace.
    coordinator.invalidate_namespace(NS).await;

    let (rows, cached) = coordinator
        .read_through(NS, &list_key, TTL_FILTERED_INVOICES, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(post_mutation.clone())
        })
        .await
        .unwrap();
    let (count, count_cached) = coordinator
        .read_through(NS, &count_key, TTL_FILTERED_INVOICES, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(2i64)
        })
        .await
        .unwrap();

    // Both keys missed and reloaded; the pre-mutation payloads are gone.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(!cached);
    assert!(!count_cached);
    assert_eq!(rows, post_mutation);
    assert_eq!(count, 2);
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let store = Arc::new(MemoryCacheStore::new());
    let coordinator = InvoiceCacheCoordinator::new(store.clone() as Arc<dyn CacheStore>);

    let calls = AtomicUsize::new(0);
    let key = cache_key::filtered_invoices("", 2, 6);

    for _ in 0..2 {
        coordinator
            .read_through(NS, &key, TTL_FILTERED_INVOICES, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(vec![row("alice", 100)])
            })
            .await
            .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    store.advance(Duration::from_secs(TTL_FILTERED_INVOICES + 1));

    coordinator
        .read_through(NS, &key, TTL_FILTERED_INVOICES, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![row("alice", 100)])
        })
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn index_drains_all_registered_keys_then_starts_fresh() {
    let store = Arc::new(MemoryCacheStore::new());
    let index = InvalidationIndex::new(store as Arc<dyn CacheStore>);

    index.register(NS, "k1").await.unwrap();
    index.register(NS, "k1").await.unwrap(); // duplicate registration is idempotent
    index.register(NS, "k2").await.unwrap();

    let mut drained = index.drain_and_clear(NS).await.unwrap();
    drained.sort();
    assert_eq!(drained, vec!["k1".to_string(), "k2".to_string()]);

    assert!(index.drain_and_clear(NS).await.unwrap().is_empty());
}

#[tokio::test]
async fn drain_against_unreachable_store_is_an_error_not_an_empty_set() {
    let index = InvalidationIndex::new(Arc::new(UnreachableStore) as Arc<dyn CacheStore>);
    assert!(index.drain_and_clear(NS).await.is_err());
}

#[tokio::test]
async fn loader_failure_propagates_and_caches_nothing() {
    let store = Arc::new(MemoryCacheStore::new());
    let coordinator = InvoiceCacheCoordinator::new(store.clone() as Arc<dyn CacheStore>);
    let key = cache_key::filtered_invoices("", 1, 6);

    let result = coordinator
        .read_through::<Vec<InvoiceSearchRow>, _, _, _>(NS, &key, TTL_FILTERED_INVOICES, || async {
            Err("database unreachable".to_string())
        })
        .await;
    assert_eq!(result.unwrap_err(), "database unreachable");

    let cache = ResultCache::new(store.clone() as Arc<dyn CacheStore>);
    assert_eq!(cache.get(&key).await.unwrap(), None);

    let index = InvalidationIndex::new(store as Arc<dyn CacheStore>);
    assert!(index.drain_and_clear(NS).await.unwrap().is_empty());
}

#[tokio::test]
async fn degraded_cache_store_falls_back_to_the_loader() {
    let coordinator = InvoiceCacheCoordinator::new(Arc::new(UnreachableStore) as Arc<dyn CacheStore>);
    let calls = AtomicUsize::new(0);
    let key = cache_key::filtered_invoices("", 1, 6);

    // Every call degrades to a loader round-trip, but none of them fails.
    for _ in 0..2 {
        let (rows, cached) = coordinator
            .read_through(NS, &key, TTL_FILTERED_INVOICES, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(vec![row("alice", 100)])
            })
            .await
            .unwrap();
        assert!(!cached);
        assert_eq!(rows.len(), 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Invalidation against the same store must not panic or hang either.
    coordinator.invalidate_namespace(NS).await;
}
