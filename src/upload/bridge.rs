//! Metadata-then-chunks upload bridge.
//!
//! # States
//! ```text
//! Init ──metadata sent──▶ MetadataSent ──first chunk──▶ Streaming
//!                                  │                        │
//!                                  └──────last chunk────────┴──▶ Closing ──ack──▶ Done
//!
//! any non-terminal state ──send/close/source error──▶ Failed
//! ```
//!
//! # Design Decisions
//! - Exactly one metadata frame, always first
//! - Content is re-chunked to `chunk_size`; every chunk but the last is full
//! - Chunks are sent one at a time, in order, on a single stream
//! - No partial result: any failure drops the stream and reports an error

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use std::fmt::Display;
use thiserror::Error;

use crate::backend::{BackendError, UploadFrame, UploadMetadata, UploadResult, UploadStream};
use crate::observability::metrics;

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Init,
    MetadataSent,
    Streaming,
    Closing,
    Done,
    Failed,
}

/// Reasons an upload did not produce an [`UploadResult`].
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not open upload stream: {0}")]
    Open(#[source] BackendError),

    #[error("send failed in state {state:?} after {bytes_sent} bytes: {source}")]
    SendFailed {
        state: BridgeState,
        bytes_sent: u64,
        #[source]
        source: BackendError,
    },

    #[error("close failed after {bytes_sent} bytes: {source}")]
    CloseFailed {
        bytes_sent: u64,
        #[source]
        source: BackendError,
    },

    #[error("reading upload content failed after {bytes_sent} bytes: {message}")]
    Source { bytes_sent: u64, message: String },
}

/// Re-emits file content as bounded frames over an [`UploadStream`].
#[derive(Debug, Clone, Copy)]
pub struct UploadBridge {
    chunk_size: usize,
}

impl Default for UploadBridge {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl UploadBridge {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Upload content that is already fully in memory.
    pub async fn upload(
        &self,
        stream: Box<dyn UploadStream>,
        metadata: UploadMetadata,
        content: Bytes,
    ) -> Result<UploadResult, UploadError> {
        let body = futures_util::stream::iter([Ok::<_, Infallible>(content)]);
        self.upload_stream(stream, metadata, body).await
    }

    /// Upload content read incrementally from `body`.
    pub async fn upload_stream<S, E>(
        &self,
        stream: Box<dyn UploadStream>,
        metadata: UploadMetadata,
        body: S,
    ) -> Result<UploadResult, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let mut session = Session::new();
        let result = session.run(stream, self.chunk_size, metadata, body).await;

        match &result {
            Ok(ack) => {
                tracing::info!(
                    video_id = ack.video_id,
                    chunks = session.chunks_sent,
                    bytes = session.bytes_sent,
                    "Upload complete"
                );
                metrics::record_upload("success", session.bytes_sent, session.chunks_sent);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    chunks = session.chunks_sent,
                    bytes = session.bytes_sent,
                    "Upload failed"
                );
                metrics::record_upload("failure", session.bytes_sent, session.chunks_sent);
            }
        }
        result
    }
}

struct Session {
    state: BridgeState,
    chunks_sent: u64,
    bytes_sent: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            state: BridgeState::Init,
            chunks_sent: 0,
            bytes_sent: 0,
        }
    }

    fn transition(&mut self, next: BridgeState) {
        tracing::debug!(from = ?self.state, to = ?next, "Upload state change");
        self.state = next;
    }

    /// The stream is owned by `run`, so returning after `fail` drops it and
    /// cancels the outbound call.
    fn fail(&mut self) {
        self.transition(BridgeState::Failed);
    }

    async fn run<S, E>(
        &mut self,
        mut stream: Box<dyn UploadStream>,
        chunk_size: usize,
        metadata: UploadMetadata,
        body: S,
    ) -> Result<UploadResult, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        self.send(stream.as_mut(), UploadFrame::Metadata(metadata)).await?;
        self.transition(BridgeState::MetadataSent);

        let mut body = std::pin::pin!(body);
        let mut pending = BytesMut::new();

        while let Some(piece) = body.next().await {
            let mut piece = match piece {
                Ok(piece) => piece,
                Err(e) => {
                    self.fail();
                    return Err(UploadError::Source {
                        bytes_sent: self.bytes_sent,
                        message: e.to_string(),
                    });
                }
            };

            if !pending.is_empty() {
                let take = (chunk_size - pending.len()).min(piece.len());
                pending.extend_from_slice(&piece.split_to(take));
                if pending.len() == chunk_size {
                    self.send_chunk(stream.as_mut(), pending.split().freeze()).await?;
                }
            }
            while piece.len() >= chunk_size {
                self.send_chunk(stream.as_mut(), piece.split_to(chunk_size)).await?;
            }
            if !piece.is_empty() {
                pending.extend_from_slice(&piece);
            }
        }
        if !pending.is_empty() {
            self.send_chunk(stream.as_mut(), pending.freeze()).await?;
        }

        self.transition(BridgeState::Closing);
        match stream.close_and_receive().await {
            Ok(ack) => {
                self.transition(BridgeState::Done);
                Ok(ack)
            }
            Err(source) => {
                self.fail();
                Err(UploadError::CloseFailed {
                    bytes_sent: self.bytes_sent,
                    source,
                })
            }
        }
    }

    async fn send_chunk(
        &mut self,
        stream: &mut dyn UploadStream,
        chunk: Bytes,
    ) -> Result<(), UploadError> {
        let len = chunk.len() as u64;
        self.send(stream, UploadFrame::Content(chunk)).await?;
        if self.state == BridgeState::MetadataSent {
            self.transition(BridgeState::Streaming);
        }
        self.chunks_sent += 1;
        self.bytes_sent += len;
        Ok(())
    }

    async fn send(
        &mut self,
        stream: &mut dyn UploadStream,
        frame: UploadFrame,
    ) -> Result<(), UploadError> {
        if let Err(source) = stream.send(frame).await {
            let state = self.state;
            self.fail();
            return Err(UploadError::SendFailed {
                state,
                bytes_sent: self.bytes_sent,
                source,
            });
        }
        Ok(())
    }
}
