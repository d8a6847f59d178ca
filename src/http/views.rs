//! Client-facing JSON shapes.

use serde::{Deserialize, Serialize};

use crate::backend::types::{
    ArchivalEvent, CategoryCount, Comment, UserProfile, VideoInfo, VideoList, VideoSummary,
};

/// Avatar shown until profile pictures are served by the user service.
pub const PLACEHOLDER_PICTURE: &str = "/static/images/placeholder1.jpg";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationData {
    pub number_of_items: u64,
    pub current_page: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub title: String,
    pub video_id: i64,
    pub views: u64,
    pub author_id: i64,
    pub author_name: String,
    pub thumbnail_loc: String,
    pub rating: f64,
    pub video_duration: i64,
}

impl From<VideoSummary> for Video {
    fn from(v: VideoSummary) -> Self {
        Self {
            title: v.video_title,
            video_id: v.video_id,
            views: v.views,
            author_id: v.author_id,
            author_name: v.author_name,
            thumbnail_loc: v.thumbnail_loc,
            rating: v.rating,
            video_duration: v.video_duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub cardinality: u64,
}

impl From<CategoryCount> for Category {
    fn from(c: CategoryCount) -> Self {
        Self {
            name: c.name,
            cardinality: c.cardinality,
        }
    }
}

/// Body of `GET /videos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageData {
    pub pagination_data: PaginationData,
    pub categories: Vec<Category>,
    pub videos: Vec<Video>,
}

impl HomePageData {
    pub fn new(list: VideoList, current_page: i64) -> Self {
        Self {
            pagination_data: PaginationData {
                number_of_items: list.number_of_videos,
                current_page,
            },
            categories: list.categories.into_iter().map(Category::from).collect(),
            videos: list.videos.into_iter().map(Video::from).collect(),
        }
    }
}

/// Body of `GET /videos/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub title: String,
    pub mpd_loc: String,
    pub views: u64,
    pub rating: f64,
    pub author_id: i64,
    pub username: String,
    pub user_description: String,
    pub video_description: String,
    pub user_subscribers: u64,
    pub profile_picture: String,
    pub upload_date: String,
    pub video_id: i64,
    pub tags: Vec<String>,
    pub video_duration: i64,
    pub thumbnail: String,
}

impl From<VideoInfo> for VideoDetail {
    fn from(v: VideoInfo) -> Self {
        Self {
            title: v.video_title,
            mpd_loc: v.video_loc,
            views: v.views,
            rating: v.rating,
            author_id: v.author_id,
            username: v.author_name,
            user_description: String::new(),
            video_description: v.description,
            user_subscribers: 0,
            profile_picture: PLACEHOLDER_PICTURE.to_string(),
            upload_date: v.upload_date,
            video_id: v.video_id,
            tags: v.tags,
            video_duration: v.video_duration,
            thumbnail: v.thumbnail,
        }
    }
}

/// One entry of `GET /comments/{video_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentData {
    pub id: i64,
    pub creation_date: String,
    pub content: String,
    pub username: String,
    pub profile_image: String,
    pub vote_score: i64,
    pub curr_user_has_upvoted: bool,
    pub curr_user_has_downvoted: bool,
    pub authored_by_current_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

impl CommentData {
    /// `current_user_id` is -1 for anonymous viewers, which matches no author.
    pub fn new(c: Comment, current_user_id: i64) -> Self {
        Self {
            id: c.comment_id,
            creation_date: c.creation_date,
            content: c.content,
            username: c.author_username,
            profile_image: c.author_profile_image_url,
            vote_score: c.vote_score,
            curr_user_has_upvoted: c.current_user_has_upvoted,
            curr_user_has_downvoted: c.current_user_has_downvoted,
            authored_by_current_user: c.author_id == current_user_id,
            parent_id: (c.parent_id != 0).then_some(c.parent_id),
        }
    }
}

/// Body of `GET /users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub user_id: i64,
    pub username: String,
    pub gender: String,
    pub bio: String,
    pub birthdate: String,
    pub join_date: String,
    pub profile_picture_url: String,
    pub pagination_data: PaginationData,
    pub banned: bool,
    pub videos: Vec<Video>,
}

impl ProfileData {
    pub fn new(user_id: i64, profile: UserProfile, uploads: VideoList, current_page: i64) -> Self {
        Self {
            user_id,
            username: profile.username,
            gender: profile.gender,
            bio: profile.bio,
            birthdate: profile.birthdate,
            join_date: profile.join_date,
            profile_picture_url: PLACEHOLDER_PICTURE.to_string(),
            pagination_data: PaginationData {
                number_of_items: uploads.number_of_videos,
                current_page,
            },
            banned: profile.banned,
            videos: uploads.videos.into_iter().map(Video::from).collect(),
        }
    }
}

/// Body of `GET /archiveevents/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEventsData {
    pub archival_events: Vec<ArchivalEvent>,
}
