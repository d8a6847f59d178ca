//! Streaming upload bridge.
//!
//! # Data Flow
//! ```text
//! multipart request (http/upload.rs)
//!     → UploadMetadata (text fields + thumbnail)
//!     → video part, streamed or buffered
//!     → bridge.rs (metadata frame, then bounded chunks)
//!     → codec.rs (length-delimited frames on the wire)
//!     → VideoService upload stream → UploadResult
//! ```

pub mod bridge;
pub mod codec;

pub use bridge::{BridgeState, UploadBridge, UploadError, DEFAULT_CHUNK_SIZE};
pub use codec::{CodecError, FrameCodec};
