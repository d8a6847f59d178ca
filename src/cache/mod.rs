//! Read-through response cache.
//!
//! # Data Flow
//! ```text
//! handler builds CacheKeyInput (normalized request params)
//!     → fingerprint.rs (canonical encoding → SHA-256 → CacheKey)
//!     → read_through.rs: store.get(key)
//!         hit  → cached JSON bytes returned verbatim
//!         miss → producer (backend call) → JSON → store.set(key, ttl) → bytes
//!     → store.rs / redis_store.rs (memory, null or redis)
//! ```
//!
//! # Design Decisions
//! - Cache failures never reach the client; reads degrade to misses
//! - Strict TTL, set once on write; hits do not refresh it
//! - No single-flight: concurrent misses populate redundantly

pub mod fingerprint;
pub mod read_through;
pub mod redis_store;
pub mod store;

use thiserror::Error;

pub use fingerprint::{fingerprint, CacheKey, CacheKeyInput, VideoListKey, SCHEMA_VERSION};
pub use read_through::{CacheStatus, CachedBody, ResponseCache};
pub use redis_store::RedisStore;
pub use store::{CacheStore, MemoryStore, NullStore};

/// The cache store could not serve a request.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}
