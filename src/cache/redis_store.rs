//! Shared cache backed by redis.

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use crate::cache::{CacheError, CacheKey, CacheStore};

/// Redis adapter. Entries are written with `SET key value PX ttl`, so expiry
/// is enforced by redis itself.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Connect to `url`. The connection manager reconnects on its own after
    /// transient failures.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            prefix: prefix.into(),
        })
    }

    fn redis_key(&self, key: &CacheKey) -> String {
        redis_key(&self.prefix, key)
    }
}

/// `<prefix>:<hex fingerprint>`.
fn redis_key(prefix: &str, key: &CacheKey) -> String {
    format!("{prefix}:{}", key.to_hex())
}

/// `PX` argument for `ttl`. Redis rejects a zero expiry, so sub-millisecond
/// TTLs round up to one.
fn px_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(self.redis_key(key)).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(self.redis_key(key), value.as_ref(), px_millis(ttl))
            .await?;
        Ok(())
    }

    async fn evict(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.redis_key(key)).await?;
        Ok(removed > 0)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
