//! Media HTTP Handlers - 文件上传与音乐

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::Arc;

use crate::application::{ApplicationError, GenerateMusic, UploadMedia};
use crate::domain::media::{MusicReferences, UploadPurpose};
use crate::infrastructure::http::dto::{
    ApiResponse, AudioResponse, FileIdResponse, MusicGenerateBody,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 读取 multipart 表单中的 file 与 purpose 字段
async fn read_upload(mut multipart: Multipart) -> Result<UploadMedia, ApiError> {
    let mut purpose: Option<String> = None;
    let mut file: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "purpose" => {
                purpose = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read purpose: {}", e)))?,
                );
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload.bin").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec();
                file = Some((bytes, filename));
            }
            _ => {}
        }
    }

    let (bytes, filename) =
        file.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let purpose: UploadPurpose = purpose
        .ok_or_else(|| ApiError::BadRequest("Purpose is required".to_string()))?
        .parse()
        .map_err(ApplicationError::from)?;

    Ok(UploadMedia {
        bytes,
        filename,
        purpose,
    })
}

/// 上传文件（克隆参考音频、视频参考图）
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<FileIdResponse>>, ApiError> {
    let command = read_upload(multipart).await?;
    let file_id = state.upload_file_handler.handle(command).await?;

    Ok(Json(ApiResponse::success(FileIdResponse {
        file_id: file_id.to_string(),
    })))
}

/// 上传音乐参考
pub async fn upload_music(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<MusicReferences>>, ApiError> {
    let command = read_upload(multipart).await?;
    let refs = state.upload_music_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(refs)))
}

/// 生成音乐，音频以 base64 返回
pub async fn generate_music(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MusicGenerateBody>,
) -> Result<Json<ApiResponse<AudioResponse>>, ApiError> {
    let audio = state
        .generate_music_handler
        .handle(GenerateMusic {
            lyrics: req.lyrics,
            refer_voice: req.refer_voice,
            refer_instrumental: req.refer_instrumental,
        })
        .await?;

    Ok(Json(ApiResponse::success(AudioResponse {
        audio: BASE64.encode(audio),
    })))
}
