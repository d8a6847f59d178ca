//! Length-delimited framing of the upload stream.
//!
//! ```text
//! +-----+----------------+-------------------------+
//! | tag | length (u32 BE)| payload                 |
//! +-----+----------------+-------------------------+
//!  0x01  metadata, payload is UploadMetadata JSON
//!  0x02  content, payload is raw file bytes
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::backend::{UploadFrame, UploadMetadata};

pub const TAG_METADATA: u8 = 0x01;
pub const TAG_CONTENT: u8 = 0x02;

const HEADER_LEN: usize = 5;

/// Largest payload a single frame may carry.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata frame is not valid JSON: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("unknown frame tag {0:#04x}")]
    UnknownTag(u8),

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(usize),
}

/// Encodes and decodes [`UploadFrame`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl Encoder<UploadFrame> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, frame: UploadFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (tag, payload) = match frame {
            UploadFrame::Metadata(meta) => (TAG_METADATA, Bytes::from(serde_json::to_vec(&meta)?)),
            UploadFrame::Content(data) => (TAG_CONTENT, data),
        };
        if payload.len() > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLarge(payload.len()));
        }

        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u8(tag);
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = UploadFrame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let tag = src[0];
        let len = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLarge(len));
        }
        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(len).freeze();
        match tag {
            TAG_METADATA => {
                let meta: UploadMetadata = serde_json::from_slice(&payload)?;
                Ok(Some(UploadFrame::Metadata(meta)))
            }
            TAG_CONTENT => Ok(Some(UploadFrame::Content(payload))),
            other => Err(CodecError::UnknownTag(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_frame_layout() {
        let mut buf = BytesMut::new();
        FrameCodec
            .encode(UploadFrame::Content(Bytes::from_static(b"abc")), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], &[TAG_CONTENT, 0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_decode_waits_for_complete_frame() {
        let mut buf = BytesMut::new();
        FrameCodec
            .encode(UploadFrame::Content(Bytes::from_static(b"hello")), &mut buf)
            .unwrap();

        let mut partial = buf.split_to(7);
        assert!(FrameCodec.decode(&mut partial).unwrap().is_none());

        partial.unsplit(buf);
        let frame = FrameCodec.decode(&mut partial).unwrap();
        assert_eq!(frame, Some(UploadFrame::Content(Bytes::from_static(b"hello"))));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        let mut buf = BytesMut::from(&[0x7f, 0, 0, 0, 0][..]);
        assert!(matches!(
            FrameCodec.decode(&mut buf),
            Err(CodecError::UnknownTag(0x7f))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_length() {
        let mut buf = BytesMut::new();
        buf.put_u8(TAG_CONTENT);
        buf.put_u32(MAX_FRAME_LEN as u32 + 1);
        assert!(matches!(
            FrameCodec.decode(&mut buf),
            Err(CodecError::FrameTooLarge(_))
        ));
    }

    #[test]
    fn test_metadata_then_content_sequence() {
        let meta = UploadMetadata {
            title: "title".into(),
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        FrameCodec
            .encode(UploadFrame::Metadata(meta.clone()), &mut buf)
            .unwrap();
        FrameCodec
            .encode(UploadFrame::Content(Bytes::from_static(b"xyz")), &mut buf)
            .unwrap();

        assert_eq!(
            FrameCodec.decode(&mut buf).unwrap(),
            Some(UploadFrame::Metadata(meta))
        );
        assert_eq!(
            FrameCodec.decode(&mut buf).unwrap(),
            Some(UploadFrame::Content(Bytes::from_static(b"xyz")))
        );
        assert_eq!(FrameCodec.decode(&mut buf).unwrap(), None);
    }
}
