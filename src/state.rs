use std::env;
use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::{CacheStore, InvoiceCacheCoordinator, RedisCacheStore};
use crate::db;

/// Shared application state: the database pool and the cache coordinator.
///
/// The coordinator receives its key-value store as an injected capability so
/// tests can substitute an in-memory store for Redis.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub invoice_cache: InvoiceCacheCoordinator,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|e| anyhow::anyhow!("DATABASE_URL must be set: {}", e))?;
        let db_pool = db::create_pool(&database_url).await?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let redis_pool = deadpool_redis::Config::from_url(&redis_url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| anyhow::anyhow!("Failed to create Redis pool: {}", e))?;

        let cache_store: Arc<dyn CacheStore> = Arc::new(RedisCacheStore::new(redis_pool));

        Ok(AppState {
            db_pool,
            invoice_cache: InvoiceCacheCoordinator::new(cache_store),
        })
    }

    /// Build state around an existing pool and cache store (test support).
    pub fn with_parts(db_pool: PgPool, cache_store: Arc<dyn CacheStore>) -> Self {
        Self {
            db_pool,
            invoice_cache: InvoiceCacheCoordinator::new(cache_store),
        }
    }
}
