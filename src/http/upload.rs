//! Multipart upload handler.
//!
//! # Data Flow
//! ```text
//! POST /upload (multipart, behind require_session)
//!     text parts + thumbnail ──▶ UploadForm
//!     video part ──▶ metadata complete? ──yes──▶ streamed straight into the bridge
//!                                      └─no───▶ buffered, bridged after the last part
//!     bridge ──▶ VideoService::open_upload ──▶ {"videoId": ...}
//! ```
//!
//! # Design Decisions
//! - Missing parts are rejected before any backend call (400)
//! - So is a thumbnail whose metadata frame would exceed `MAX_FRAME_LEN`
//! - Parts that arrive after a streamed video part are not read

use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use bytes::Bytes;

use crate::backend::{UploadMetadata, UploadResult, UserProfile};
use crate::http::response::GatewayError;
use crate::http::server::AppState;
use crate::http::session::SessionUser;
use crate::upload::codec::MAX_FRAME_LEN;
use crate::upload::UploadError;

pub const THUMBNAIL_FIELD: &str = "file[0]";
pub const VIDEO_FIELD: &str = "file[1]";

/// Provenance recorded for videos uploaded directly rather than archived.
const DIRECT_UPLOAD_SITE: &str = "blank";
const NO_FOREIGN_ID: &str = "0";

/// Parts collected so far.
#[derive(Debug, Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    category: Option<String>,
    thumbnail: Option<Bytes>,
    video: Option<Bytes>,
}

impl UploadForm {
    /// Build the metadata frame, or name the first missing or oversized part.
    fn metadata(&self, uploader: &UserProfile) -> Result<UploadMetadata, GatewayError> {
        let title = self
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GatewayError::malformed("title", "required"))?;
        let description = self
            .description
            .clone()
            .ok_or_else(|| GatewayError::malformed("description", "required"))?;
        let category = self
            .category
            .clone()
            .ok_or_else(|| GatewayError::malformed("category", "required"))?;
        let thumbnail = self
            .thumbnail
            .clone()
            .ok_or_else(|| GatewayError::malformed(THUMBNAIL_FIELD, "required"))?;

        let metadata = UploadMetadata {
            title,
            description,
            author_uid: NO_FOREIGN_ID.to_string(),
            original_video_link: NO_FOREIGN_ID.to_string(),
            author_username: uploader.username.clone(),
            original_site: DIRECT_UPLOAD_SITE.to_string(),
            original_id: NO_FOREIGN_ID.to_string(),
            domestic_author_id: uploader.user_id,
            tags: self.tags.clone(),
            thumbnail,
            category,
        };
        let encoded = serde_json::to_vec(&metadata)
            .map_err(|e| GatewayError::malformed(THUMBNAIL_FIELD, e.to_string()))?
            .len();
        if encoded > MAX_FRAME_LEN {
            return Err(thumbnail_too_large(encoded));
        }
        Ok(metadata)
    }
}

fn thumbnail_too_large(encoded: usize) -> GatewayError {
    GatewayError::malformed(
        THUMBNAIL_FIELD,
        format!("metadata of {encoded} bytes exceeds the {MAX_FRAME_LEN} byte limit"),
    )
}

/// Base64 length of `raw` thumbnail bytes.
fn encoded_thumbnail_len(raw: usize) -> usize {
    raw.div_ceil(3) * 4
}

/// Tags arrive as repeated parts, comma-separated lists, or both.
fn split_tags(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `POST /upload`
pub async fn upload(
    State(state): State<AppState>,
    Extension(SessionUser(uploader)): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResult>, GatewayError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "category" => form.category = Some(field.text().await?),
            "tags" => {
                let raw = field.text().await?;
                form.tags.extend(split_tags(&raw));
            }
            THUMBNAIL_FIELD => {
                let thumbnail = field.bytes().await?;
                let encoded = encoded_thumbnail_len(thumbnail.len());
                if encoded > MAX_FRAME_LEN {
                    return Err(thumbnail_too_large(encoded));
                }
                form.thumbnail = Some(thumbnail);
            }
            VIDEO_FIELD => {
                if form.video.is_some() {
                    return Err(GatewayError::malformed(VIDEO_FIELD, "sent more than once"));
                }
                match form.metadata(&uploader) {
                    Ok(metadata) => {
                        tracing::debug!(user_id = uploader.user_id, "Streaming video part");
                        let stream = state.video.open_upload().await.map_err(UploadError::Open)?;
                        let result = state.bridge.upload_stream(stream, metadata, field).await?;
                        return Ok(Json(result));
                    }
                    Err(_) => {
                        tracing::debug!(
                            user_id = uploader.user_id,
                            "Video part arrived before metadata, buffering"
                        );
                        form.video = Some(field.bytes().await?);
                    }
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown upload part"),
        }
    }

    let metadata = form.metadata(&uploader)?;
    let video = form
        .video
        .take()
        .ok_or_else(|| GatewayError::malformed(VIDEO_FIELD, "required"))?;

    let stream = state.video.open_upload().await.map_err(UploadError::Open)?;
    let result = state.bridge.upload(stream, metadata, video).await?;
    Ok(Json(result))
}
