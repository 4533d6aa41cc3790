//! Speech / Voice HTTP Handlers

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::ports::SpeechOutput;
use crate::application::{ApplicationError, CloneVoice, SynthesizeSpeech};
use crate::domain::generation::FileRef;
use crate::domain::voice::VoiceId;
use crate::infrastructure::http::dto::{
    ApiResponse, AudioResponse, CloneVoiceBody, T2aRequest, VoiceIdResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 语音合成
///
/// stream=true 时原样转发上游的 `data:` 事件流，否则返回 `{audio}`
pub async fn t2a(
    State(state): State<Arc<AppState>>,
    Json(req): Json<T2aRequest>,
) -> Result<Response, ApiError> {
    let output = state
        .synthesize_speech_handler
        .handle(SynthesizeSpeech {
            text: req.text,
            stream: req.stream,
            voice_setting: req.voice_setting,
            language_boost: req.language_boost,
        })
        .await?;

    match output {
        SpeechOutput::Single(audio) => {
            Ok(Json(ApiResponse::success(AudioResponse { audio })).into_response())
        }
        SpeechOutput::Stream(bytes) => {
            tracing::debug!("Relaying speech event stream");
            Response::builder()
                .header(header::CONTENT_TYPE, "text/event-stream")
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from_stream(bytes))
                .map_err(|e| ApiError::Internal(format!("Failed to build stream response: {}", e)))
        }
    }
}

/// 克隆音色
pub async fn clone_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CloneVoiceBody>,
) -> Result<Json<ApiResponse<VoiceIdResponse>>, ApiError> {
    let file_id = req.file_id.trim();
    if file_id.is_empty() {
        return Err(ApiError::BadRequest("Missing file_id".to_string()));
    }
    let voice_id = VoiceId::parse(req.voice_id).map_err(ApplicationError::from)?;

    let voice_id = state
        .clone_voice_handler
        .handle(CloneVoice {
            file_id: FileRef::new(file_id),
            voice_id,
            noise_reduction: req.noise_reduction,
            preview_text: req.text,
        })
        .await?;

    Ok(Json(ApiResponse::success(VoiceIdResponse {
        voice_id: voice_id.to_string(),
    })))
}
