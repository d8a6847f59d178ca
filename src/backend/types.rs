//! Wire types exchanged with the backend services.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort key for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderCategory {
    UploadDate,
    Rating,
    Views,
    MyRatings,
}

impl OrderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderCategory::UploadDate => "upload_date",
            OrderCategory::Rating => "rating",
            OrderCategory::Views => "views",
            OrderCategory::MyRatings => "my_ratings",
        }
    }
}

impl Default for OrderCategory {
    fn default() -> Self {
        OrderCategory::UploadDate
    }
}

impl FromStr for OrderCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload_date" => Ok(OrderCategory::UploadDate),
            "rating" => Ok(OrderCategory::Rating),
            "views" => Ok(OrderCategory::Views),
            "my_ratings" => Ok(OrderCategory::MyRatings),
            other => Err(format!("invalid sort category supplied: {other}")),
        }
    }
}

impl fmt::Display for OrderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Desc
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("invalid sort direction supplied: {other}")),
        }
    }
}

/// Query sent to `GetVideoList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    pub order_by: OrderCategory,
    pub direction: SortDirection,
    pub search_val: String,
    pub page_number: i64,
    pub show_unapproved: bool,
    pub unapproved_only: bool,
    pub category: String,
    pub from_user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub video_title: String,
    pub video_id: i64,
    pub views: u64,
    pub author_id: i64,
    pub author_name: String,
    pub thumbnail_loc: String,
    pub rating: f64,
    pub video_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub name: String,
    pub cardinality: u64,
}

/// Response of `GetVideoList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoList {
    pub videos: Vec<VideoSummary>,
    pub number_of_videos: u64,
    pub categories: Vec<CategoryCount>,
}

/// Response of `GetVideo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoInfo {
    pub video_id: i64,
    pub video_title: String,
    pub description: String,
    pub video_loc: String,
    pub views: u64,
    pub rating: f64,
    pub author_id: i64,
    pub author_name: String,
    pub upload_date: String,
    pub tags: Vec<String>,
    pub video_duration: i64,
    pub thumbnail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub comment_id: i64,
    pub creation_date: String,
    pub content: String,
    pub author_id: i64,
    pub author_username: String,
    pub author_profile_image_url: String,
    pub vote_score: i64,
    pub current_user_has_upvoted: bool,
    pub current_user_has_downvoted: bool,
    pub parent_id: i64,
}

/// A user as known to the identity service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub user_id: i64,
    pub username: String,
    pub gender: String,
    pub bio: String,
    pub birthdate: String,
    pub join_date: String,
    pub banned: bool,
    pub rank: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchivalEvent {
    pub video_url: String,
    pub parent_url: String,
    pub message: String,
    pub timestamp: String,
}

/// Engagement signal forwarded to the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feedback {
    pub feedback_type: String,
    pub user_id: String,
    pub item_id: String,
    pub timestamp: String,
}

impl Feedback {
    /// A "read" signal for `video_id` by `user_id`, stamped with the current
    /// unix time in seconds.
    pub fn read(user_id: i64, video_id: i64) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            feedback_type: "read".to_string(),
            user_id: user_id.to_string(),
            item_id: video_id.to_string(),
            timestamp: now.to_string(),
        }
    }
}

/// Descriptive record sent as the first frame of every upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub author_uid: String,
    pub original_video_link: String,
    pub author_username: String,
    pub original_site: String,
    pub original_id: String,
    pub domestic_author_id: i64,
    pub tags: Vec<String>,
    #[serde(with = "base64_bytes")]
    pub thumbnail: Bytes,
    pub category: String,
}

/// One frame of the upload stream.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadFrame {
    Metadata(UploadMetadata),
    Content(Bytes),
}

/// Acknowledgement returned once an upload stream is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub video_id: i64,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
