//! Ping Handler
//!
//! 健康检查，同时报告上游平台是否可达

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{ApiResponse, PingResponse};
use crate::infrastructure::http::state::AppState;

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PingResponse>> {
    let status = if state.platform.health_check().await {
        "ok"
    } else {
        "degraded"
    };

    Json(ApiResponse::success(PingResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
