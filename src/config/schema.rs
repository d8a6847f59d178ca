//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Backend RPC service endpoints.
    pub backends: BackendsConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Upload bridge settings.
    pub upload: UploadConfig,

    /// Best-effort background task queue.
    pub background: BackgroundConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8083").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8083".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests and outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Overall deadline for non-upload requests, in seconds.
    pub request_secs: u64,

    /// Overall deadline for upload requests, in seconds.
    pub upload_secs: u64,

    /// Timeout for a single unary backend call, in seconds.
    pub backend_call_secs: u64,

    /// Connection establishment timeout for backend calls, in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upload_secs: 30 * 60,
            backend_call_secs: 10,
            connect_secs: 5,
        }
    }
}

/// Base URLs of the backend services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendsConfig {
    /// Video/content service.
    pub video_url: String,

    /// User/identity service.
    pub user_url: String,

    /// Scheduling/archival service.
    pub scheduler_url: String,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            video_url: "http://videoservice:7777".to_string(),
            user_url: "http://userservice:7777".to_string(),
            scheduler_url: "http://scheduler:7777".to_string(),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the read-through response cache.
    pub enabled: bool,

    /// Shared redis instance. When unset, an in-process store is used.
    pub redis_url: Option<String>,

    /// Time-to-live of a cached response in seconds.
    pub ttl_secs: u64,

    /// Prefix applied to every key written to redis.
    pub key_prefix: String,

    /// Capacity of the in-process store.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            ttl_secs: 60,
            key_prefix: "front-gateway".to_string(),
            max_entries: 10_000,
        }
    }
}

/// Upload bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum size of a content frame sent to the video service.
    pub chunk_size: usize,

    /// Maximum accepted multipart body size.
    pub max_body_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024 * 1024,
            max_body_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

/// Background side-channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Maximum number of queued tasks before new ones are dropped.
    pub queue_capacity: usize,

    /// Recommendation engine endpoint receiving engagement feedback.
    pub feedback_url: Option<String>,

    /// API key sent to the recommendation engine.
    pub feedback_api_key: String,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            feedback_url: None,
            feedback_api_key: String::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
