//! JSON-over-HTTP transport for the backend services.
//!
//! Unary calls are `POST {base}/rpc/{Method}` with a JSON body. The upload
//! call is a single streaming `POST {base}/rpc/UploadVideo` whose body is a
//! sequence of [`FrameCodec`] frames, answered by one JSON acknowledgement.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::codec::Encoder;
use url::Url;

use crate::backend::{
    ArchivalEvent, BackendError, Comment, SchedulerService, UploadFrame, UploadResult,
    UploadStream, UserProfile, UserService, VideoInfo, VideoList, VideoQuery, VideoService,
};
use crate::upload::codec::FrameCodec;

/// Frames buffered between the bridge and the request body.
const UPLOAD_CHANNEL_DEPTH: usize = 4;

/// A unary RPC endpoint of one backend service.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    base: Url,
    service: &'static str,
    call_timeout: Duration,
}

impl RpcClient {
    pub fn new(
        client: Client,
        base: &str,
        service: &'static str,
        call_timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            base: Url::parse(base)?,
            service,
            call_timeout,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/rpc/{}", self.base.as_str().trim_end_matches('/'), method)
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        tracing::debug!(service = self.service, method, "Backend call");

        let response = self
            .client
            .post(self.endpoint(method))
            .timeout(self.call_timeout)
            .json(request)
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                service: self.service,
                source,
            })?;

        decode_response(self.service, response).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(if status == StatusCode::NOT_FOUND {
            BackendError::NotFound {
                service,
                what: message,
            }
        } else {
            BackendError::Status {
                service,
                status: status.as_u16(),
                message,
            }
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| BackendError::Transport { service, source })?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Video service client.
#[derive(Debug, Clone)]
pub struct HttpVideoService {
    rpc: RpcClient,
}

impl HttpVideoService {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl VideoService for HttpVideoService {
    async fn get_video_list(&self, query: &VideoQuery) -> Result<VideoList, BackendError> {
        self.rpc.call("GetVideoList", query).await
    }

    async fn get_video(&self, video_id: i64) -> Result<VideoInfo, BackendError> {
        self.rpc
            .call("GetVideo", &json!({ "videoID": video_id.to_string() }))
            .await
    }

    async fn view_video(&self, video_id: i64) -> Result<(), BackendError> {
        let _: IgnoredAny = self
            .rpc
            .call("ViewVideo", &json!({ "videoID": video_id }))
            .await?;
        Ok(())
    }

    async fn get_comments(
        &self,
        video_id: i64,
        current_user_id: i64,
    ) -> Result<Vec<Comment>, BackendError> {
        #[derive(serde::Deserialize)]
        struct CommentList {
            #[serde(default)]
            comments: Vec<Comment>,
        }

        let list: CommentList = self
            .rpc
            .call(
                "GetCommentsForVideo",
                &json!({ "videoID": video_id, "currUserID": current_user_id }),
            )
            .await?;
        Ok(list.comments)
    }

    async fn get_recommendations(
        &self,
        user_id: i64,
        video_id: i64,
    ) -> Result<VideoList, BackendError> {
        self.rpc
            .call(
                "GetVideoRecommendations",
                &json!({ "userId": user_id, "videoId": video_id }),
            )
            .await
    }

    async fn open_upload(&self) -> Result<Box<dyn UploadStream>, BackendError> {
        let service = self.rpc.service;
        let (frames, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(UPLOAD_CHANNEL_DEPTH);

        let request = self
            .rpc
            .client
            .post(self.rpc.endpoint("UploadVideo"))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(ReceiverStream::new(rx)));

        let call = tokio::spawn(async move {
            let response = request
                .send()
                .await
                .map_err(|source| BackendError::Transport { service, source })?;
            decode_response::<UploadResult>(service, response).await
        });

        Ok(Box::new(HttpUploadStream {
            service,
            codec: FrameCodec::default(),
            frames: Some(frames),
            call: Some(call),
        }))
    }
}

/// Outbound upload call backed by a streaming request body.
pub struct HttpUploadStream {
    service: &'static str,
    codec: FrameCodec,
    frames: Option<mpsc::Sender<Result<Bytes, std::io::Error>>>,
    call: Option<JoinHandle<Result<UploadResult, BackendError>>>,
}

impl HttpUploadStream {
    fn closed(&self, message: impl Into<String>) -> BackendError {
        BackendError::StreamClosed {
            service: self.service,
            message: message.into(),
        }
    }

    async fn finish(&mut self) -> Result<UploadResult, BackendError> {
        let call = self
            .call
            .take()
            .ok_or_else(|| self.closed("upload call already finished"))?;
        match call.await {
            Ok(result) => result,
            Err(e) => Err(self.closed(e.to_string())),
        }
    }
}

#[async_trait]
impl UploadStream for HttpUploadStream {
    async fn send(&mut self, frame: UploadFrame) -> Result<(), BackendError> {
        let mut buf = BytesMut::new();
        self.codec
            .encode(frame, &mut buf)
            .map_err(|e| self.closed(e.to_string()))?;

        let Some(frames) = self.frames.as_ref() else {
            return Err(self.closed("stream already closed"));
        };

        if frames.send(Ok(buf.freeze())).await.is_err() {
            // The request ended before the body did; report why.
            self.frames = None;
            return Err(match self.finish().await {
                Err(e) => e,
                Ok(_) => self.closed("backend acknowledged before the upload completed"),
            });
        }
        Ok(())
    }

    async fn close_and_receive(mut self: Box<Self>) -> Result<UploadResult, BackendError> {
        // Dropping the sender ends the request body.
        self.frames = None;
        self.finish().await
    }
}

impl Drop for HttpUploadStream {
    fn drop(&mut self) {
        if let Some(call) = self.call.take() {
            call.abort();
        }
    }
}

/// User service client.
#[derive(Debug, Clone)]
pub struct HttpUserService {
    rpc: RpcClient,
}

impl HttpUserService {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl UserService for HttpUserService {
    async fn validate_session(&self, token: &str) -> Result<UserProfile, BackendError> {
        self.rpc.call("ValidateJWT", &json!({ "jwt": token })).await
    }

    async fn get_user(&self, user_id: i64) -> Result<UserProfile, BackendError> {
        self.rpc
            .call("GetUserFromID", &json!({ "userID": user_id }))
            .await
    }
}

/// Scheduler service client.
#[derive(Debug, Clone)]
pub struct HttpSchedulerService {
    rpc: RpcClient,
}

impl HttpSchedulerService {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl SchedulerService for HttpSchedulerService {
    async fn list_archival_events(
        &self,
        download_id: Option<i64>,
    ) -> Result<Vec<ArchivalEvent>, BackendError> {
        #[derive(serde::Deserialize)]
        struct EventList {
            #[serde(default)]
            events: Vec<ArchivalEvent>,
        }

        let request = json!({
            "downloadID": download_id.unwrap_or(0),
            "showAll": download_id.is_none(),
        });
        let list: EventList = self.rpc.call("ListArchivalEvents", &request).await?;
        Ok(list.events)
    }
}
