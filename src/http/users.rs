//! Profile, comment, recommendation and archive handlers (uncached).

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::http::params::{parse_id, parse_page_number, uploads_query, PageParams};
use crate::http::response::GatewayError;
use crate::http::server::AppState;
use crate::http::session::current_user;
use crate::http::views::{ArchiveEventsData, CommentData, ProfileData, Video};

/// User id the video service treats as "nobody" for comment vote flags.
const ANONYMOUS_COMMENTER: i64 = -1;

/// User id the recommender treats as "nobody".
const ANONYMOUS_VIEWER: i64 = 0;

/// `GET /users/{id}`
pub async fn user_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProfileData>, GatewayError> {
    let user_id = parse_id("id", &id)?;
    let page = parse_page_number(params.page_number)?;

    let profile = state.users.get_user(user_id).await?;
    let uploads = state
        .video
        .get_video_list(&uploads_query(user_id, page))
        .await?;

    Ok(Json(ProfileData::new(user_id, profile, uploads, page)))
}

/// `GET /comments/{video_id}`
pub async fn comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<CommentData>>, GatewayError> {
    let video_id = parse_id("video_id", &video_id)?;
    let current = current_user(&state, &headers)
        .await
        .map_or(ANONYMOUS_COMMENTER, |p| p.user_id);

    let comments = state.video.get_comments(video_id, current).await?;
    Ok(Json(
        comments
            .into_iter()
            .map(|c| CommentData::new(c, current))
            .collect(),
    ))
}

/// `GET /recommendations/{video_id}`
pub async fn recommendations(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Video>>, GatewayError> {
    let video_id = parse_id("video_id", &video_id)?;
    let viewer = current_user(&state, &headers)
        .await
        .map_or(ANONYMOUS_VIEWER, |p| p.user_id);

    let list = state.video.get_recommendations(viewer, video_id).await?;
    Ok(Json(list.videos.into_iter().map(Video::from).collect()))
}

/// `GET /archiveevents/{id}`; `all` lists every event.
pub async fn archive_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveEventsData>, GatewayError> {
    let download_id = match id.as_str() {
        "all" => None,
        other => Some(parse_id("id", other)?),
    };

    let archival_events = state.scheduler.list_archival_events(download_id).await?;
    Ok(Json(ArchiveEventsData { archival_events }))
}
