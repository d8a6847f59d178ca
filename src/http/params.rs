//! Query and path parameter decoding.
//!
//! Every optional string parameter passes through [`normalize_optional`]
//! exactly once, so `?search=`, `?search=undefined` and a missing `search`
//! all build the same cache key and the same backend query.

use serde::Deserialize;

use crate::backend::types::{OrderCategory, SortDirection, VideoQuery};
use crate::cache::VideoListKey;
use crate::http::response::GatewayError;

/// Values the frontend sends in place of "no value".
const ABSENT_SENTINELS: [&str; 4] = ["", "undefined", "none", "null"];

/// Map empty and sentinel values to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !ABSENT_SENTINELS.contains(&v.trim()))
}

/// Query string of `GET /videos`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideosParams {
    pub search: Option<String>,
    pub sort_category: Option<String>,
    pub order: Option<String>,
    pub unapproved: Option<String>,
    pub category: Option<String>,
    pub page_number: Option<String>,
}

impl VideosParams {
    /// Validate and normalize into the listing cache key.
    pub fn into_key(self) -> Result<VideoListKey, GatewayError> {
        let order_by = match normalize_optional(self.sort_category) {
            Some(v) => v
                .parse::<OrderCategory>()
                .map_err(|e| GatewayError::malformed("sortCategory", e))?,
            None => OrderCategory::default(),
        };

        let direction = match normalize_optional(self.order) {
            Some(v) => v
                .parse::<SortDirection>()
                .map_err(|e| GatewayError::malformed("order", e))?,
            None => SortDirection::default(),
        };

        Ok(VideoListKey {
            search: normalize_optional(self.search),
            order_by,
            direction,
            unapproved_only: normalize_optional(self.unapproved).as_deref() == Some("true"),
            category: normalize_optional(self.category),
            page_number: parse_page_number(self.page_number)?,
        })
    }
}

/// Query string carrying only a page number.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page_number: Option<String>,
}

/// Page numbers start at 1, which is also the default.
pub fn parse_page_number(value: Option<String>) -> Result<i64, GatewayError> {
    match normalize_optional(value) {
        None => Ok(1),
        Some(v) => match v.trim().parse::<i64>() {
            Ok(n) if n >= 1 => Ok(n),
            Ok(n) => Err(GatewayError::malformed(
                "pageNumber",
                format!("must be at least 1, got {n}"),
            )),
            Err(_) => Err(GatewayError::malformed(
                "pageNumber",
                format!("not an integer: {v}"),
            )),
        },
    }
}

/// Parse a numeric path segment.
pub fn parse_id(name: &'static str, value: &str) -> Result<i64, GatewayError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| GatewayError::malformed(name, format!("not an integer: {value}")))
}

/// Backend query for a public listing.
pub fn listing_query(key: &VideoListKey) -> VideoQuery {
    VideoQuery {
        order_by: key.order_by,
        direction: key.direction,
        search_val: key.search.clone().unwrap_or_default(),
        page_number: key.page_number,
        show_unapproved: true,
        unapproved_only: key.unapproved_only,
        category: key.category.clone().unwrap_or_default(),
        from_user_id: None,
    }
}

/// Backend query for the uploads of one user, newest first.
pub fn uploads_query(user_id: i64, page_number: i64) -> VideoQuery {
    VideoQuery {
        order_by: OrderCategory::UploadDate,
        direction: SortDirection::Desc,
        search_val: String::new(),
        page_number,
        show_unapproved: true,
        unapproved_only: false,
        category: String::new(),
        from_user_id: Some(user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{fingerprint, CacheKeyInput};

    fn params(pairs: &[(&str, &str)]) -> VideosParams {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/videos?{query}").parse().unwrap();
        axum::extract::Query::<VideosParams>::try_from_uri(&uri)
            .unwrap()
            .0
    }

    #[test]
    fn test_normalize_optional_conflates_sentinels() {
        for v in ["", "undefined", "none", "null", "  "] {
            assert_eq!(normalize_optional(Some(v.to_string())), None, "{v:?}");
        }
        assert_eq!(normalize_optional(None), None);
        assert_eq!(
            normalize_optional(Some("cats".into())),
            Some("cats".to_string())
        );
    }

    #[test]
    fn test_defaults() {
        let key = params(&[]).into_key().unwrap();
        assert_eq!(key.order_by, OrderCategory::UploadDate);
        assert_eq!(key.direction, SortDirection::Desc);
        assert_eq!(key.page_number, 1);
        assert!(!key.unapproved_only);
        assert_eq!(key.search, None);
        assert_eq!(key.category, None);
    }

    #[test]
    fn test_sentinel_and_missing_share_a_key() {
        let explicit = params(&[
            ("search", "none"),
            ("category", "undefined"),
            ("sortCategory", "undefined"),
        ])
        .into_key()
        .unwrap();
        let missing = params(&[]).into_key().unwrap();
        assert_eq!(
            fingerprint(&CacheKeyInput::VideoList(explicit)),
            fingerprint(&CacheKeyInput::VideoList(missing))
        );
    }

    #[test]
    fn test_full_listing() {
        let key = params(&[
            ("search", "cats"),
            ("sortCategory", "views"),
            ("order", "asc"),
            ("unapproved", "true"),
            ("category", "music"),
            ("pageNumber", "3"),
        ])
        .into_key()
        .unwrap();

        assert_eq!(key.search.as_deref(), Some("cats"));
        assert_eq!(key.order_by, OrderCategory::Views);
        assert_eq!(key.direction, SortDirection::Asc);
        assert!(key.unapproved_only);
        assert_eq!(key.category.as_deref(), Some("music"));
        assert_eq!(key.page_number, 3);

        let query = listing_query(&key);
        assert_eq!(query.search_val, "cats");
        assert!(query.show_unapproved);
        assert_eq!(query.from_user_id, None);
    }

    #[test]
    fn test_rejects_malformed_values() {
        for pairs in [
            [("sortCategory", "popularity")],
            [("order", "sideways")],
            [("pageNumber", "0")],
            [("pageNumber", "two")],
        ] {
            let err = params(&pairs).into_key().unwrap_err();
            assert!(
                matches!(err, GatewayError::MalformedParameter { .. }),
                "{pairs:?}"
            );
        }
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("id", "42").unwrap(), 42);
        assert!(parse_id("id", "abc").is_err());
    }
}
