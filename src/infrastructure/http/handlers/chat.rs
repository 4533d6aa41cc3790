//! Chat HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::SendChat;
use crate::domain::conversation::Role;
use crate::infrastructure::http::dto::{ApiResponse, ChatRequest, ChatResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 对话补全
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    let result = state
        .chat_handler
        .handle(SendChat {
            messages: req.messages,
        })
        .await?;

    Ok(Json(ApiResponse::success(ChatResponse {
        reply: result.reply,
        role: Role::Assistant,
    })))
}
