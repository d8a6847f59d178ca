//! Shared utilities for the gateway integration tests.
//!
//! In-memory fakes stand in for the backend services; they record every
//! call so tests can assert on what the gateway did, not only on what it
//! answered.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

use front_gateway::backend::types::{CategoryCount, VideoSummary};
use front_gateway::backend::{
    ArchivalEvent, BackendError, Comment, Feedback, FeedbackSink, SchedulerService, UploadFrame,
    UploadResult, UploadStream, UserProfile, UserService, VideoInfo, VideoList, VideoQuery,
    VideoService,
};
use front_gateway::cache::{CacheStore, MemoryStore};
use front_gateway::config::GatewayConfig;
use front_gateway::{Backends, HttpServer, Shutdown};

pub const BOUNDARY: &str = "gateway-test-boundary";

pub fn summary(video_id: i64) -> VideoSummary {
    VideoSummary {
        video_title: format!("video {video_id}"),
        video_id,
        views: 10,
        author_id: 1,
        author_name: "mika".into(),
        thumbnail_loc: format!("/thumbs/{video_id}.jpg"),
        rating: 4.0,
        video_duration: 120,
    }
}

pub fn profile(user_id: i64, username: &str) -> UserProfile {
    UserProfile {
        user_id,
        username: username.into(),
        join_date: "2024-01-01".into(),
        rank: 2,
        ..Default::default()
    }
}

/// What the fake upload stream saw.
#[derive(Debug, Default)]
pub struct UploadLog {
    pub opened: usize,
    pub frames: Vec<UploadFrame>,
    pub closed: bool,
}

impl UploadLog {
    pub fn content(&self) -> Vec<u8> {
        self.frames
            .iter()
            .filter_map(|f| match f {
                UploadFrame::Content(data) => Some(data.to_vec()),
                UploadFrame::Metadata(_) => None,
            })
            .flatten()
            .collect()
    }
}

struct RecordingUploadStream {
    log: Arc<Mutex<UploadLog>>,
    fail_on_frame: Option<usize>,
}

#[async_trait]
impl UploadStream for RecordingUploadStream {
    async fn send(&mut self, frame: UploadFrame) -> Result<(), BackendError> {
        let mut log = self.log.lock().unwrap();
        if self.fail_on_frame == Some(log.frames.len()) {
            return Err(BackendError::StreamClosed {
                service: "video",
                message: "connection reset".into(),
            });
        }
        log.frames.push(frame);
        Ok(())
    }

    async fn close_and_receive(self: Box<Self>) -> Result<UploadResult, BackendError> {
        self.log.lock().unwrap().closed = true;
        Ok(UploadResult { video_id: 4242 })
    }
}

/// Video service fake with canned listings and recorded calls.
#[derive(Default)]
pub struct FakeVideoService {
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub queries: Mutex<Vec<VideoQuery>>,
    pub views: Mutex<Vec<i64>>,
    pub comment_calls: Mutex<Vec<(i64, i64)>>,
    pub recommendation_calls: Mutex<Vec<(i64, i64)>>,
    pub uploads: Arc<Mutex<UploadLog>>,
    pub fail_upload_on_frame: Option<usize>,
    pub fail_listing: bool,
}

#[async_trait]
impl VideoService for FakeVideoService {
    async fn get_video_list(&self, query: &VideoQuery) -> Result<VideoList, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_listing {
            return Err(BackendError::Status {
                service: "video",
                status: 500,
                message: "database down".into(),
            });
        }
        Ok(VideoList {
            videos: vec![summary(1), summary(2)],
            number_of_videos: 2,
            categories: vec![CategoryCount {
                name: "music".into(),
                cardinality: 2,
            }],
        })
    }

    async fn get_video(&self, video_id: i64) -> Result<VideoInfo, BackendError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if video_id == 404 {
            return Err(BackendError::NotFound {
                service: "video",
                what: format!("video {video_id}"),
            });
        }
        Ok(VideoInfo {
            video_id,
            video_title: format!("video {video_id}"),
            description: "a video".into(),
            video_loc: format!("/videos/{video_id}.mpd"),
            views: 10,
            rating: 4.0,
            author_id: 1,
            author_name: "mika".into(),
            upload_date: "2024-01-01".into(),
            tags: vec!["cats".into()],
            video_duration: 120,
            thumbnail: format!("/thumbs/{video_id}.jpg"),
        })
    }

    async fn view_video(&self, video_id: i64) -> Result<(), BackendError> {
        self.views.lock().unwrap().push(video_id);
        Ok(())
    }

    async fn get_comments(
        &self,
        video_id: i64,
        current_user_id: i64,
    ) -> Result<Vec<Comment>, BackendError> {
        self.comment_calls
            .lock()
            .unwrap()
            .push((video_id, current_user_id));
        Ok(vec![
            Comment {
                comment_id: 1,
                content: "first".into(),
                author_id: 7,
                author_username: "mika".into(),
                ..Default::default()
            },
            Comment {
                comment_id: 2,
                content: "reply".into(),
                author_id: 8,
                author_username: "sora".into(),
                parent_id: 1,
                ..Default::default()
            },
        ])
    }

    async fn get_recommendations(
        &self,
        user_id: i64,
        video_id: i64,
    ) -> Result<VideoList, BackendError> {
        self.recommendation_calls
            .lock()
            .unwrap()
            .push((user_id, video_id));
        Ok(VideoList {
            videos: vec![summary(video_id + 1)],
            number_of_videos: 1,
            categories: Vec::new(),
        })
    }

    async fn open_upload(&self) -> Result<Box<dyn UploadStream>, BackendError> {
        self.uploads.lock().unwrap().opened += 1;
        Ok(Box::new(RecordingUploadStream {
            log: self.uploads.clone(),
            fail_on_frame: self.fail_upload_on_frame,
        }))
    }
}

/// Resolves tokens from a fixed table; anything else is rejected with 401.
#[derive(Default)]
pub struct FakeUserService {
    pub sessions: HashMap<String, UserProfile>,
    pub validations: AtomicUsize,
}

impl FakeUserService {
    pub fn with_session(token: &str, profile: UserProfile) -> Self {
        let mut sessions = HashMap::new();
        sessions.insert(token.to_string(), profile);
        Self {
            sessions,
            validations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UserService for FakeUserService {
    async fn validate_session(&self, token: &str) -> Result<UserProfile, BackendError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .get(token)
            .cloned()
            .ok_or_else(|| BackendError::Status {
                service: "user",
                status: 401,
                message: "invalid jwt".into(),
            })
    }

    async fn get_user(&self, user_id: i64) -> Result<UserProfile, BackendError> {
        self.sessions
            .values()
            .find(|p| p.user_id == user_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                service: "user",
                what: format!("user {user_id}"),
            })
    }
}

#[derive(Default)]
pub struct FakeScheduler {
    pub requests: Mutex<Vec<Option<i64>>>,
}

#[async_trait]
impl SchedulerService for FakeScheduler {
    async fn list_archival_events(
        &self,
        download_id: Option<i64>,
    ) -> Result<Vec<ArchivalEvent>, BackendError> {
        self.requests.lock().unwrap().push(download_id);
        Ok(vec![ArchivalEvent {
            video_url: "https://example.org/v/1".into(),
            parent_url: "https://example.org/c/1".into(),
            message: "archived".into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
        }])
    }
}

#[derive(Default)]
pub struct FakeFeedback {
    pub received: Mutex<Vec<Feedback>>,
}

#[async_trait]
impl FeedbackSink for FakeFeedback {
    async fn insert_feedback(&self, feedback: Vec<Feedback>) -> Result<(), BackendError> {
        self.received.lock().unwrap().extend(feedback);
        Ok(())
    }
}

/// A gateway router wired to fakes, with its background worker running.
pub struct TestGateway {
    pub app: Router,
    pub video: Arc<FakeVideoService>,
    pub users: Arc<FakeUserService>,
    pub scheduler: Arc<FakeScheduler>,
    pub feedback: Arc<FakeFeedback>,
    pub store: Arc<MemoryStore>,
    pub shutdown: Shutdown,
    worker: tokio::task::JoinHandle<()>,
}

impl TestGateway {
    pub fn new(config: GatewayConfig, video: FakeVideoService, users: FakeUserService) -> Self {
        let video = Arc::new(video);
        let users = Arc::new(users);
        let scheduler = Arc::new(FakeScheduler::default());
        let feedback = Arc::new(FakeFeedback::default());
        let store = Arc::new(MemoryStore::new(128));

        let backends = Backends {
            video: video.clone(),
            users: users.clone(),
            scheduler: scheduler.clone(),
            feedback: Some(feedback.clone()),
        };
        let mut server = HttpServer::new(&config, backends, store.clone() as Arc<dyn CacheStore>);

        let shutdown = Shutdown::new();
        let worker = server.take_worker().expect("fresh server has a worker");
        let worker = tokio::spawn(worker.run_until(shutdown.subscribe()));

        Self {
            app: server.router(),
            video,
            users,
            scheduler,
            feedback,
            store,
            shutdown,
            worker,
        }
    }

    pub fn default_with(video: FakeVideoService, users: FakeUserService) -> Self {
        Self::new(GatewayConfig::default(), video, users)
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_session(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, format!("jwt={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Stop the worker after it has run everything queued so far.
    pub async fn drain(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.worker)
            .await
            .expect("worker should drain")
            .unwrap();
    }
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// One part of a multipart/form-data body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode `parts` as multipart/form-data using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>], token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/upload").header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("jwt={token}"));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}
