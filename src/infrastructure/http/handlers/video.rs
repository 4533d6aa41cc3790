//! Video HTTP Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{ApplicationError, GetVideoStatus, ResolveFile, SubmitVideo};
use crate::domain::generation::{FileRef, VideoModel};
use crate::infrastructure::http::dto::{
    ApiResponse, FileQuery, TaskIdResponse, UrlResponse, VideoGenerateBody, VideoStatusQuery,
    VideoStatusResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

fn file_ref(id: Option<String>) -> Option<FileRef> {
    id.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(FileRef::new)
}

/// 提交视频生成任务
pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VideoGenerateBody>,
) -> Result<Json<ApiResponse<TaskIdResponse>>, ApiError> {
    let model = match req.model.as_deref().map(str::trim) {
        None | Some("") => state.default_video_model,
        Some(name) => name.parse::<VideoModel>().map_err(ApplicationError::from)?,
    };

    let result = state
        .submit_video_handler
        .handle(SubmitVideo {
            model,
            prompt: req.prompt,
            prompt_optimizer: req.prompt_optimizer.unwrap_or(true),
            first_frame_image: file_ref(req.first_frame_image),
            subject_reference: file_ref(req.subject_reference),
        })
        .await?;

    Ok(Json(ApiResponse::success(TaskIdResponse {
        task_id: result.task_id,
    })))
}

/// 查询视频任务状态
pub async fn video_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoStatusQuery>,
) -> Result<Json<ApiResponse<VideoStatusResponse>>, ApiError> {
    let snapshot = state
        .get_video_status_handler
        .handle(GetVideoStatus {
            task_id: query.task_id.unwrap_or_default(),
        })
        .await?;

    Ok(Json(ApiResponse::success(VideoStatusResponse {
        status: snapshot.status,
        progress: snapshot.progress.percent(),
        file_id: snapshot.file_ref.map(|f| f.to_string()),
    })))
}

/// 解析视频文件下载地址
pub async fn video_download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileQuery>,
) -> Result<Json<ApiResponse<UrlResponse>>, ApiError> {
    let url = state
        .resolve_file_handler
        .handle(ResolveFile {
            file_id: query.file_id.unwrap_or_default(),
        })
        .await?;

    Ok(Json(ApiResponse::success(UrlResponse { url })))
}
