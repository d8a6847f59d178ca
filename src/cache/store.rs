//! Cache store adapters.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::{CacheError, CacheKey};

/// Key/value store with per-entry TTL.
///
/// `get` returns `Ok(None)` for expired, evicted or never-set keys, which is
/// never confused with an entry holding an empty payload.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Remove an entry. Returns whether one was present.
    async fn evict(&self, key: &CacheKey) -> Result<bool, CacheError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
struct Entry {
    data: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process store used when no shared cache is configured.
///
/// Expiry follows the tokio clock, so paused-time tests can step past a TTL.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<CacheKey, Entry>>,
    max_entries: usize,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of entries, expired ones included until they are purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self, now: Instant) {
        if self.entries.len() < self.max_entries {
            return;
        }
        self.entries.retain(|_, entry| !entry.is_expired(now));

        while self.entries.len() >= self.max_entries {
            let soonest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().expires_at)
                .map(|entry| *entry.key());
            match soonest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.data.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        if !self.entries.contains_key(key) {
            self.make_room(now);
        }
        self.entries.insert(
            *key,
            Entry {
                data: value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn evict(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Store that never holds anything. Used when the shared cache cannot be
/// reached at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

#[async_trait]
impl CacheStore for NullStore {
    async fn get(&self, _: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _: &CacheKey, _: Bytes, _: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict(&self, _: &CacheKey) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{fingerprint, CacheKeyInput};

    fn key(id: i64) -> CacheKey {
        fingerprint(&CacheKeyInput::VideoDetail { video_id: id })
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_then_expiry() {
        let store = MemoryStore::new(16);
        let payload = Bytes::from_static(b"{\"title\":\"cats\"}");

        store.set(&key(1), payload.clone(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get(&key(1)).await.unwrap(), Some(payload.clone()));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get(&key(1)).await.unwrap(), Some(payload));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get(&key(1)).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_payload_is_not_a_miss() {
        let store = MemoryStore::new(16);
        store.set(&key(1), Bytes::new(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get(&key(1)).await.unwrap(), Some(Bytes::new()));
        assert_eq!(store.get(&key(2)).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_write_supersedes() {
        let store = MemoryStore::new(16);
        store.set(&key(1), Bytes::from_static(b"old"), Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        store.set(&key(1), Bytes::from_static(b"new"), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get(&key(1)).await.unwrap(), Some(Bytes::from_static(b"new")));
    }

    #[tokio::test]
    async fn test_evict() {
        let store = MemoryStore::new(16);
        store.set(&key(1), Bytes::from_static(b"x"), Duration::from_secs(60)).await.unwrap();

        assert!(store.evict(&key(1)).await.unwrap());
        assert!(!store.evict(&key(1)).await.unwrap());
        assert_eq!(store.get(&key(1)).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_soonest_expiry() {
        let store = MemoryStore::new(2);
        store.set(&key(1), Bytes::from_static(b"a"), Duration::from_secs(5)).await.unwrap();
        store.set(&key(2), Bytes::from_static(b"b"), Duration::from_secs(60)).await.unwrap();
        store.set(&key(3), Bytes::from_static(b"c"), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&key(1)).await.unwrap(), None);
        assert!(store.get(&key(2)).await.unwrap().is_some());
        assert!(store.get(&key(3)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_null_store_always_misses() {
        let store = NullStore;
        store.set(&key(1), Bytes::from_static(b"x"), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get(&key(1)).await.unwrap(), None);
    }
}
