//! 代理服务端路由：统一响应格式、参数校验与语音流转发

use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use genstudio::application::ports::PlatformError;
use genstudio::domain::generation::VideoModel;
use genstudio::domain::media::AudioUploadPolicy;
use genstudio::infrastructure::adapters::{FakePlatform, SymphoniaDecoder};
use genstudio::infrastructure::http::{AppState, HttpServer, ServerConfig};

fn router(platform: FakePlatform) -> Router {
    let state = AppState::new(
        Arc::new(platform),
        Arc::new(SymphoniaDecoder::new()),
        AudioUploadPolicy::default(),
        VideoModel::Video01,
    );
    HttpServer::new(ServerConfig::default(), state).build_router()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (axum::http::response::Parts, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (parts, bytes.to_vec())
}

async fn send_json(router: Router, request: Request<Body>) -> Value {
    let (parts, body) = send(router, request).await;
    assert_eq!(parts.status, axum::http::StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_ping() {
    let body = send_json(router(FakePlatform::new()), get("/api/ping")).await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_chat_returns_reply() {
    let request = post_json(
        "/api/chat",
        json!({"messages": [
            {"role": "assistant", "content": "Hello!"},
            {"role": "user", "content": "draw a cat"}
        ]}),
    );
    let body = send_json(router(FakePlatform::new()), request).await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["reply"], "You said: draw a cat");
    assert_eq!(body["data"]["role"], "assistant");
}

#[tokio::test]
async fn test_empty_chat_is_bad_request() {
    let body = send_json(
        router(FakePlatform::new()),
        post_json("/api/chat", json!({"messages": []})),
    )
    .await;
    assert_eq!(body["errno"], 400);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_video_status_requires_task_id() {
    let body = send_json(router(FakePlatform::new()), get("/api/video/status")).await;
    assert_eq!(body["errno"], 400);
}

#[tokio::test]
async fn test_video_download_requires_file_id() {
    let body = send_json(router(FakePlatform::new()), get("/api/video/download")).await;
    assert_eq!(body["errno"], 400);
}

#[tokio::test]
async fn test_video_download_resolves_url() {
    let body = send_json(
        router(FakePlatform::new()),
        get("/api/video/download?file_id=video-file-1"),
    )
    .await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["url"], "https://files.fake/video-file-1");
}

#[tokio::test]
async fn test_unknown_api_path_is_not_found() {
    let body = send_json(router(FakePlatform::new()), get("/api/nothing/here")).await;
    assert_eq!(body["errno"], 404);
    assert_eq!(body["error"], "API endpoint not found");
}

#[tokio::test]
async fn test_t2a_stream_is_relayed_unchanged() {
    let chunks = vec![
        b"data: {\"data\":{\"audio\":\"AAA\"}}\n".to_vec(),
        b"\ndata: {\"data\":{\"audio\":\"BBB\"}}\n\n".to_vec(),
    ];
    let expected = chunks.concat();
    let platform = FakePlatform::new().with_speech_stream(chunks);

    let (parts, body) = send(
        router(platform),
        post_json("/api/t2a", json!({"text": "hello", "stream": true})),
    )
    .await;
    assert_eq!(parts.headers["content-type"], "text/event-stream");
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_t2a_single_returns_audio() {
    let platform = FakePlatform::new().with_speech_single("UklGRg==");
    let body = send_json(
        router(platform),
        post_json("/api/t2a", json!({"text": "hello"})),
    )
    .await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["audio"], "UklGRg==");
}

#[tokio::test]
async fn test_t2a_empty_text_is_bad_request() {
    let body = send_json(
        router(FakePlatform::new()),
        post_json("/api/t2a", json!({"text": "  "})),
    )
    .await;
    assert_eq!(body["errno"], 400);
}

#[tokio::test]
async fn test_video_generate_uses_default_model() {
    let body = send_json(
        router(FakePlatform::new()),
        post_json("/api/video/generate", json!({"prompt": "a cat surfing"})),
    )
    .await;
    assert_eq!(body["errno"], 0);
    assert_eq!(body["data"]["task_id"], "task-1");
}

#[tokio::test]
async fn test_video_generate_rejects_unknown_model() {
    let body = send_json(
        router(FakePlatform::new()),
        post_json("/api/video/generate", json!({"model": "video-99", "prompt": "cat"})),
    )
    .await;
    assert_eq!(body["errno"], 400);
}

#[tokio::test]
async fn test_upstream_error_message_is_passed_through() {
    let platform = FakePlatform::new()
        .with_submit_error(PlatformError::remote(1008, "insufficient balance"));
    let body = send_json(
        router(platform),
        post_json("/api/video/generate", json!({"prompt": "a cat"})),
    )
    .await;
    assert_eq!(body["errno"], 502);
    assert_eq!(body["error"], "insufficient balance");
}

#[tokio::test]
async fn test_clone_voice_requires_file_id() {
    let body = send_json(
        router(FakePlatform::new()),
        post_json("/api/voice/clone", json!({"voice_id": "narrator01"})),
    )
    .await;
    assert_eq!(body["errno"], 400);
    assert_eq!(body["error"], "Missing file_id");
}
