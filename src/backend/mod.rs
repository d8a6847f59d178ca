//! Backend service clients.
//!
//! # Data Flow
//! ```text
//! handler (http/*.rs)
//!     → VideoService / UserService / SchedulerService trait object
//!     → http.rs (JSON over POST {base}/rpc/{Method})
//!     → backend service
//!
//! upload handler
//!     → VideoService::open_upload → UploadStream
//!     → send(Metadata), send(Content)..., close_and_receive()
//!     → one streaming POST whose body is FrameCodec frames
//! ```
//!
//! # Design Decisions
//! - Handlers depend on traits so tests run against in-memory fakes
//! - No retries at this layer; a failed call is surfaced to the client
//! - Dropping an `UploadStream` aborts the outbound call

pub mod error;
pub mod feedback;
pub mod http;
pub mod types;

use async_trait::async_trait;

pub use error::BackendError;
pub use feedback::{FeedbackSink, HttpFeedbackSink};
pub use http::{HttpSchedulerService, HttpUserService, HttpVideoService, RpcClient};
pub use types::{
    ArchivalEvent, Comment, Feedback, UploadFrame, UploadMetadata, UploadResult, UserProfile,
    VideoInfo, VideoList, VideoQuery,
};

/// Video/content service.
#[async_trait]
pub trait VideoService: Send + Sync {
    async fn get_video_list(&self, query: &VideoQuery) -> Result<VideoList, BackendError>;

    async fn get_video(&self, video_id: i64) -> Result<VideoInfo, BackendError>;

    /// Increment the view counter of a video.
    async fn view_video(&self, video_id: i64) -> Result<(), BackendError>;

    /// Comments on a video, with vote flags relative to `current_user_id` (-1 for anonymous).
    async fn get_comments(
        &self,
        video_id: i64,
        current_user_id: i64,
    ) -> Result<Vec<Comment>, BackendError>;

    async fn get_recommendations(
        &self,
        user_id: i64,
        video_id: i64,
    ) -> Result<VideoList, BackendError>;

    /// Open a client-streaming upload call.
    async fn open_upload(&self) -> Result<Box<dyn UploadStream>, BackendError>;
}

/// User/identity service.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Resolve a session token to the profile it belongs to.
    async fn validate_session(&self, token: &str) -> Result<UserProfile, BackendError>;

    async fn get_user(&self, user_id: i64) -> Result<UserProfile, BackendError>;
}

/// Scheduling/archival service.
#[async_trait]
pub trait SchedulerService: Send + Sync {
    /// Archival events of one download, or of every download when `download_id` is `None`.
    async fn list_archival_events(
        &self,
        download_id: Option<i64>,
    ) -> Result<Vec<ArchivalEvent>, BackendError>;
}

/// Handle on one outbound client-streaming call.
///
/// Frames are delivered in the order they are sent. The call has no result
/// until `close_and_receive` returns.
#[async_trait]
pub trait UploadStream: Send {
    async fn send(&mut self, frame: UploadFrame) -> Result<(), BackendError>;

    async fn close_and_receive(self: Box<Self>) -> Result<UploadResult, BackendError>;
}
