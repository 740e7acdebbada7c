// ============================================================================
// CACHE MODULE - cache-aside services for query results
// ============================================================================

pub mod invoice_cache;
pub mod store;

pub use invoice_cache::{InvalidationIndex, InvoiceCacheCoordinator, ResultCache};
pub use store::{CacheError, CacheStore, MemoryCacheStore, RedisCacheStore};
