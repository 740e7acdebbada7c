// ============================================================================
// CACHE STORE - key-value boundary for cached query results
// ============================================================================

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool as RedisPool;
use parking_lot::Mutex;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::time::timeout;

/// Upper bound applied to every cache store call. A slow cache must never
/// stall a request; a timed-out read degrades to a miss at the coordinator.
pub const CACHE_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Cache-layer failure, distinguishable in logs from an ordinary miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache connection unavailable: {0}")]
    Unavailable(#[from] deadpool_redis::PoolError),

    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),
}

/// Key-value operations the caching layer is built on.
///
/// A missing key is `Ok(None)`, never an error; `Err` means the store itself
/// could not be reached or did not answer in time.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, overwriting any existing entry and
    /// resetting its expiry to now + `ttl_seconds`.
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Best-effort bulk removal; unknown keys are ignored.
    async fn del(&self, keys: &[String]) -> Result<(), CacheError>;

    /// Add a member to a set; duplicate adds are no-ops.
    async fn sadd(&self, set_key: &str, member: &str) -> Result<(), CacheError>;

    /// Return all members of a set and delete the set entry itself.
    async fn drain_set(&self, set_key: &str) -> Result<Vec<String>, CacheError>;
}

// ============================================================================
// REDIS BACKEND
// ============================================================================

/// `CacheStore` over a shared Redis pool.
pub struct RedisCacheStore {
    pool: RedisPool,
}

impl RedisCacheStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        timeout(CACHE_OP_TIMEOUT, self.pool.get())
            .await
            .map_err(|_| CacheError::Timeout(CACHE_OP_TIMEOUT))?
            .map_err(CacheError::from)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn().await?;
        timeout(CACHE_OP_TIMEOUT, conn.get::<_, Option<String>>(key))
            .await
            .map_err(|_| CacheError::Timeout(CACHE_OP_TIMEOUT))?
            .map_err(CacheError::from)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        timeout(CACHE_OP_TIMEOUT, conn.set_ex::<_, _, ()>(key, value, ttl_seconds))
            .await
            .map_err(|_| CacheError::Timeout(CACHE_OP_TIMEOUT))?
            .map_err(CacheError::from)
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        timeout(CACHE_OP_TIMEOUT, conn.del::<_, ()>(keys))
            .await
            .map_err(|_| CacheError::Timeout(CACHE_OP_TIMEOUT))?
            .map_err(CacheError::from)
    }

    async fn sadd(&self, set_key: &str, member: &str) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        timeout(CACHE_OP_TIMEOUT, conn.sadd::<_, _, ()>(set_key, member))
            .await
            .map_err(|_| CacheError::Timeout(CACHE_OP_TIMEOUT))?
            .map_err(CacheError::from)
    }

    async fn drain_set(&self, set_key: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn().await?;
        // SMEMBERS + DEL under MULTI/EXEC so a concurrent SADD lands either
        // in the drained set or in the next generation, never in limbo.
        let mut pipe = redis::pipe();
        pipe.atomic().smembers(set_key).del(set_key);
        let (members, _deleted): (Vec<String>, i64) =
            timeout(CACHE_OP_TIMEOUT, pipe.query_async(&mut conn))
                .await
                .map_err(|_| CacheError::Timeout(CACHE_OP_TIMEOUT))?
                .map_err(CacheError::from)?;
        Ok(members)
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

struct StoredValue {
    value: String,
    expires_at: Instant,
}

/// In-process `CacheStore` with the same TTL semantics as the Redis backend.
/// Used by the test suite in place of a live Redis instance.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, StoredValue>,
    sets: DashMap<String, HashSet<String>>,
    skew: Mutex<Duration>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift the store's notion of "now" forward, expiring entries whose
    /// TTL falls inside the window. Test support.
    pub fn advance(&self, by: Duration) {
        *self.skew.lock() += by;
    }

    fn now(&self) -> Instant {
        Instant::now() + *self.skew.lock()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > self.now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let entry = StoredValue {
            value: value.to_string(),
            expires_at: self.now() + Duration::from_secs(ttl_seconds),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn sadd(&self, set_key: &str, member: &str) -> Result<(), CacheError> {
        self.sets
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn drain_set(&self, set_key: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .sets
            .remove(set_key)
            .map(|(_, members)| members.into_iter().collect())
            .unwrap_or_default())
    }
}
