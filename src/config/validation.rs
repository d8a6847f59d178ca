//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, chunk size bounded)
//! - Check that every endpoint parses as a usable URL or socket address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::upload::codec::MAX_FRAME_LEN;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {value} exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    check_url(&mut errors, "backends.video_url", &config.backends.video_url, &["http", "https"]);
    check_url(&mut errors, "backends.user_url", &config.backends.user_url, &["http", "https"]);
    check_url(
        &mut errors,
        "backends.scheduler_url",
        &config.backends.scheduler_url,
        &["http", "https"],
    );
    if let Some(redis_url) = &config.cache.redis_url {
        check_url(&mut errors, "cache.redis_url", redis_url, &["redis", "rediss"]);
    }
    if let Some(feedback_url) = &config.background.feedback_url {
        check_url(&mut errors, "background.feedback_url", feedback_url, &["http", "https"]);
    }

    check_nonzero(&mut errors, "timeouts.connect_secs", config.timeouts.connect_secs as usize);
    check_nonzero(&mut errors, "timeouts.request_secs", config.timeouts.request_secs as usize);
    check_nonzero(&mut errors, "timeouts.upload_secs", config.timeouts.upload_secs as usize);
    check_nonzero(
        &mut errors,
        "timeouts.backend_call_secs",
        config.timeouts.backend_call_secs as usize,
    );
    check_nonzero(&mut errors, "cache.ttl_secs", config.cache.ttl_secs as usize);
    check_nonzero(&mut errors, "cache.max_entries", config.cache.max_entries);
    check_nonzero(&mut errors, "upload.chunk_size", config.upload.chunk_size);
    check_nonzero(&mut errors, "upload.max_body_bytes", config.upload.max_body_bytes);
    check_nonzero(&mut errors, "background.queue_capacity", config.background.queue_capacity);

    if config.upload.chunk_size > MAX_FRAME_LEN {
        errors.push(ValidationError::TooLarge {
            field: "upload.chunk_size",
            value: config.upload.chunk_size,
            max: MAX_FRAME_LEN,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str, schemes: &[&str]) {
    let valid = Url::parse(value)
        .map(|url| schemes.contains(&url.scheme()) && url.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_nonzero(errors: &mut Vec<ValidationError>, field: &'static str, value: usize) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}
