//! Video listing and detail handlers (both cached).

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;

use crate::backend::Feedback;
use crate::cache::{CacheKeyInput, CachedBody};
use crate::http::params::{listing_query, parse_id, VideosParams};
use crate::http::request::session_token;
use crate::http::response::GatewayError;
use crate::http::server::AppState;
use crate::http::views::{HomePageData, VideoDetail};

/// `GET /videos`
pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<VideosParams>,
) -> Result<CachedBody, GatewayError> {
    let key = params.into_key()?;
    let query = listing_query(&key);
    let page = key.page_number;

    state
        .cache
        .get_or_populate(&CacheKeyInput::VideoList(key), || async {
            let list = state.video.get_video_list(&query).await?;
            Ok::<_, GatewayError>(HomePageData::new(list, page))
        })
        .await
}

/// `GET /videos/{id}`
pub async fn video_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<CachedBody, GatewayError> {
    let video_id = parse_id("id", &id)?;

    // Counted on every request, cache hit or not.
    dispatch_viewed(&state, video_id, session_token(&headers));

    state
        .cache
        .get_or_populate(&CacheKeyInput::VideoDetail { video_id }, || async {
            let info = state.video.get_video(video_id).await?;
            Ok::<_, GatewayError>(VideoDetail::from(info))
        })
        .await
}

/// Queue the view-count increment and, for signed-in viewers, a "read"
/// signal for the recommender.
fn dispatch_viewed(state: &AppState, video_id: i64, token: Option<String>) {
    let video = state.video.clone();
    let users = state.users.clone();
    let feedback = state.feedback.clone();

    state.tasks.dispatch("viewed", async move {
        if let (Some(sink), Some(token)) = (feedback, token) {
            match users.validate_session(&token).await {
                Ok(profile) => {
                    let signal = Feedback::read(profile.user_id, video_id);
                    if let Err(e) = sink.insert_feedback(vec![signal]).await {
                        tracing::warn!(video_id, error = %e, "Failed to record read feedback");
                    }
                }
                Err(e) => tracing::debug!(error = %e, "No session for read feedback"),
            }
        }
        video.view_video(video_id).await
    });
}
