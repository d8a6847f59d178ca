//! Multipart upload through the gateway router into a recording stream.

use axum::http::StatusCode;
use std::sync::atomic::Ordering;

use front_gateway::backend::UploadFrame;
use front_gateway::config::GatewayConfig;

mod common;
use common::{
    body_json, profile, upload_request, FakeUserService, FakeVideoService, Part, TestGateway,
};

const TOKEN: &str = "uploader-token";

fn gateway_with(video: FakeVideoService, chunk_size: usize) -> TestGateway {
    let mut config = GatewayConfig::default();
    config.upload.chunk_size = chunk_size;
    TestGateway::new(
        config,
        video,
        FakeUserService::with_session(TOKEN, profile(7, "mika")),
    )
}

fn video_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8).collect()
}

#[tokio::test]
async fn test_upload_requires_session() {
    let gw = gateway_with(FakeVideoService::default(), 4);
    let parts = [Part::Text("title", "clip")];

    let res = gw.send(upload_request(&parts, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = gw.send(upload_request(&parts, Some("forged"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(gw.video.uploads.lock().unwrap().opened, 0);
}

#[tokio::test]
async fn test_streams_video_after_metadata() {
    let gw = gateway_with(FakeVideoService::default(), 4);
    let video = video_bytes(10);

    let parts = [
        Part::Text("title", "clip"),
        Part::Text("description", "a cat"),
        Part::Text("tags", "cats, pets"),
        Part::Text("tags", "funny"),
        Part::Text("category", "animals"),
        Part::File("file[0]", "thumb.png", b"png-bytes"),
        Part::File("file[1]", "clip.mp4", &video),
    ];
    let res = gw.send(upload_request(&parts, Some(TOKEN))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["videoId"], 4242);

    let log = gw.video.uploads.lock().unwrap();
    assert_eq!(log.opened, 1);
    assert!(log.closed);

    let UploadFrame::Metadata(meta) = &log.frames[0] else {
        panic!("first frame must be metadata");
    };
    assert_eq!(meta.title, "clip");
    assert_eq!(meta.description, "a cat");
    assert_eq!(meta.tags, vec!["cats", "pets", "funny"]);
    assert_eq!(meta.category, "animals");
    assert_eq!(&meta.thumbnail[..], b"png-bytes");
    assert_eq!(meta.domestic_author_id, 7);
    assert_eq!(meta.author_username, "mika");

    for frame in &log.frames[1..] {
        match frame {
            UploadFrame::Content(chunk) => assert!(chunk.len() <= 4),
            UploadFrame::Metadata(_) => panic!("metadata sent twice"),
        }
    }
    assert_eq!(log.frames.len(), 1 + 3);
    assert_eq!(log.content(), video);
}

#[tokio::test]
async fn test_video_before_metadata_is_buffered_then_bridged() {
    let gw = gateway_with(FakeVideoService::default(), 3);
    let video = video_bytes(7);

    let parts = [
        Part::File("file[1]", "clip.mp4", &video),
        Part::Text("title", "clip"),
        Part::Text("description", ""),
        Part::Text("category", "animals"),
        Part::File("file[0]", "thumb.png", b"png"),
    ];
    let res = gw.send(upload_request(&parts, Some(TOKEN))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let log = gw.video.uploads.lock().unwrap();
    assert!(matches!(log.frames[0], UploadFrame::Metadata(_)));
    assert_eq!(log.frames.len(), 1 + 3);
    assert_eq!(log.content(), video);
}

#[tokio::test]
async fn test_missing_parts_are_rejected_before_backend() {
    let gw = gateway_with(FakeVideoService::default(), 4);

    let no_video = [
        Part::Text("title", "clip"),
        Part::Text("description", "d"),
        Part::Text("category", "c"),
        Part::File("file[0]", "thumb.png", b"png"),
    ];
    let res = gw.send(upload_request(&no_video, Some(TOKEN))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let no_thumbnail = [
        Part::Text("title", "clip"),
        Part::Text("description", "d"),
        Part::Text("category", "c"),
        Part::File("file[1]", "clip.mp4", b"video"),
    ];
    let res = gw.send(upload_request(&no_thumbnail, Some(TOKEN))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"]
        .as_str()
        .unwrap()
        .contains("file[0]"));

    assert_eq!(gw.video.uploads.lock().unwrap().opened, 0);
}

#[tokio::test]
async fn test_oversized_thumbnail_rejected_before_backend() {
    let gw = gateway_with(FakeVideoService::default(), 4);

    // 13 MiB encodes to more than a whole metadata frame; 12 MiB fits on its
    // own but not together with the rest of the metadata.
    for raw_len in [13 * 1024 * 1024, 12 * 1024 * 1024] {
        let thumbnail = vec![0u8; raw_len];
        let parts = [
            Part::Text("title", "clip"),
            Part::Text("description", "d"),
            Part::Text("category", "c"),
            Part::File("file[0]", "thumb.png", &thumbnail),
            Part::File("file[1]", "clip.mp4", b"video"),
        ];
        let res = gw.send(upload_request(&parts, Some(TOKEN))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "thumbnail of {raw_len} bytes");
        assert!(body_json(res).await["error"]
            .as_str()
            .unwrap()
            .contains("file[0]"));
    }

    assert_eq!(gw.video.uploads.lock().unwrap().opened, 0);
}

#[tokio::test]
async fn test_send_failure_is_bad_gateway_without_result() {
    let gw = gateway_with(
        FakeVideoService {
            fail_upload_on_frame: Some(2),
            ..Default::default()
        },
        2,
    );
    let video = video_bytes(8);

    let parts = [
        Part::Text("title", "clip"),
        Part::Text("description", "d"),
        Part::Text("category", "c"),
        Part::File("file[0]", "thumb.png", b"png"),
        Part::File("file[1]", "clip.mp4", &video),
    ];
    let res = gw.send(upload_request(&parts, Some(TOKEN))).await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let log = gw.video.uploads.lock().unwrap();
    assert!(!log.closed);
    assert_eq!(log.frames.len(), 2);
    assert_eq!(gw.users.validations.load(Ordering::SeqCst), 1);
}
