//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/chat              POST  对话补全
//! - /api/t2a               POST  语音合成（可流式）
//! - /api/files/upload      POST  上传文件（multipart: file, purpose）
//! - /api/voice/clone       POST  克隆音色
//! - /api/music/upload      POST  上传音乐参考（multipart: file, purpose）
//! - /api/music/generate    POST  生成音乐
//! - /api/video/generate    POST  提交视频任务
//! - /api/video/status      GET   查询视频任务（?task_id=）
//! - /api/video/download    GET   解析下载地址（?file_id=）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::error::ApiError;
use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/chat", post(handlers::chat))
        .route("/t2a", post(handlers::t2a))
        .route("/files/upload", post(handlers::upload_file))
        .route("/voice/clone", post(handlers::clone_voice))
        .nest("/music", music_routes())
        .nest("/video", video_routes())
        .fallback(api_not_found)
}

/// Music 路由
fn music_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(handlers::upload_music))
        .route("/generate", post(handlers::generate_music))
}

/// Video 路由
fn video_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(handlers::generate_video))
        .route("/status", get(handlers::video_status))
        .route("/download", get(handlers::video_download))
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("API endpoint not found".to_string())
}
