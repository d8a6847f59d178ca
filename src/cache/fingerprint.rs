//! Cache key derivation.
//!
//! A [`CacheKeyInput`] is hashed field by field in declared order into a
//! canonical byte encoding, then digested with SHA-256. Construction order of
//! the input never matters; only field values do.
//!
//! Encoding per field:
//! - absent optional: `0x00`
//! - string: `0x01`, u64 BE length, UTF-8 bytes
//! - integer: `0x02`, i64 BE
//! - boolean: `0x03`, `0x00` or `0x01`
//!
//! Sentinel and empty optional values are conflated with absence by the
//! request boundary before they reach this module, so an empty string is never
//! hashed in place of `None`.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::backend::types::{OrderCategory, SortDirection};

/// Bumped whenever a cached response shape changes, so entries written by an
/// older build are never served by a newer one.
pub const SCHEMA_VERSION: u8 = 1;

const TAG_ABSENT: u8 = 0x00;
const TAG_STR: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_BOOL: u8 = 0x03;

/// Fixed-length fingerprint of a cacheable request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", &self.to_hex()[..16])
    }
}

/// Normalized parameters of the video listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoListKey {
    pub search: Option<String>,
    pub order_by: OrderCategory,
    pub direction: SortDirection,
    pub unapproved_only: bool,
    pub category: Option<String>,
    pub page_number: i64,
}

/// Every request shape whose response may be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKeyInput {
    VideoList(VideoListKey),
    VideoDetail { video_id: i64 },
}

impl CacheKeyInput {
    /// Endpoint label, also hashed as the variant tag.
    pub fn endpoint(&self) -> &'static str {
        match self {
            CacheKeyInput::VideoList(_) => "video_list",
            CacheKeyInput::VideoDetail { .. } => "video_detail",
        }
    }
}

/// Compute the cache key of `input`.
pub fn fingerprint(input: &CacheKeyInput) -> CacheKey {
    let mut enc = KeyEncoder::new();
    enc.raw(&[SCHEMA_VERSION]);
    enc.str(Some(input.endpoint()));

    match input {
        CacheKeyInput::VideoList(key) => {
            enc.str(key.search.as_deref());
            enc.str(Some(key.order_by.as_str()));
            enc.str(Some(match key.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            }));
            enc.bool(key.unapproved_only);
            enc.str(key.category.as_deref());
            enc.int(key.page_number);
        }
        CacheKeyInput::VideoDetail { video_id } => {
            enc.int(*video_id);
        }
    }

    enc.finish()
}

struct KeyEncoder {
    hasher: Sha256,
}

impl KeyEncoder {
    fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    fn str(&mut self, value: Option<&str>) {
        match value {
            None => self.raw(&[TAG_ABSENT]),
            Some(s) => {
                self.raw(&[TAG_STR]);
                self.raw(&(s.len() as u64).to_be_bytes());
                self.raw(s.as_bytes());
            }
        }
    }

    fn int(&mut self, value: i64) {
        self.raw(&[TAG_INT]);
        self.raw(&value.to_be_bytes());
    }

    fn bool(&mut self, value: bool) {
        self.raw(&[TAG_BOOL, value as u8]);
    }

    fn finish(self) -> CacheKey {
        CacheKey(self.hasher.finalize().into())
    }
}
