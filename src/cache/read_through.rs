//! Read-through response cache.

use bytes::Bytes;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{fingerprint, CacheKey, CacheKeyInput, CacheStore};
use crate::config::CacheConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store; the producer did not run.
    Hit,
    /// Produced fresh and offered to the store.
    Miss,
    /// Caching disabled; produced fresh.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// A serialized JSON response body and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    pub body: Bytes,
    pub status: CacheStatus,
}

/// Composes [`fingerprint`] and a [`CacheStore`] into "try cache, else
/// compute and populate".
///
/// There is no locking: concurrent misses on one key each run the producer
/// and each write the entry. Hits never extend an entry's TTL.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            enabled: true,
        }
    }

    pub fn from_config(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(config.ttl_secs),
            enabled: config.enabled,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Return the cached body for `input`, or run `produce`, store its JSON
    /// serialization and return that.
    ///
    /// Store failures are logged and counted, never returned: a failed read
    /// behaves as a miss and a failed write is dropped. Only `produce` and
    /// serialization errors reach the caller.
    pub async fn get_or_populate<T, E, F, Fut>(
        &self,
        input: &CacheKeyInput,
        produce: F,
    ) -> Result<CachedBody, E>
    where
        T: Serialize,
        E: From<serde_json::Error>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let endpoint = input.endpoint();

        if !self.enabled {
            let body = serde_json::to_vec(&produce().await?)?;
            return Ok(CachedBody {
                body: body.into(),
                status: CacheStatus::Bypass,
            });
        }

        let key = fingerprint(input);
        if let Some(body) = self.lookup(&key, endpoint).await {
            return Ok(CachedBody {
                body,
                status: CacheStatus::Hit,
            });
        }

        let body = Bytes::from(serde_json::to_vec(&produce().await?)?);
        self.populate(&key, endpoint, body.clone()).await;

        Ok(CachedBody {
            body,
            status: CacheStatus::Miss,
        })
    }

    async fn lookup(&self, key: &CacheKey, endpoint: &'static str) -> Option<Bytes> {
        match self.store.get(key).await {
            Ok(Some(body)) => {
                tracing::debug!(endpoint, key = ?key, "Cache hit");
                metrics::record_cache_lookup(endpoint, "hit");
                Some(body)
            }
            Ok(None) => {
                tracing::debug!(endpoint, key = ?key, "Cache miss");
                metrics::record_cache_lookup(endpoint, "miss");
                None
            }
            Err(e) => {
                tracing::warn!(
                    endpoint,
                    store = self.store.name(),
                    error = %e,
                    "Cache read failed, computing response directly"
                );
                metrics::record_cache_lookup(endpoint, "error");
                None
            }
        }
    }

    async fn populate(&self, key: &CacheKey, endpoint: &'static str, body: Bytes) {
        if let Err(e) = self.store.set(key, body, self.ttl).await {
            tracing::warn!(
                endpoint,
                store = self.store.name(),
                error = %e,
                "Failed to populate cache"
            );
            metrics::record_cache_write_failure(endpoint);
        }
    }
}
