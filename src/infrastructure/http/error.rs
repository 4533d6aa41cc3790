//! HTTP Error Handling
//!
//! 所有错误都以 HTTP 200 返回，错误类别由 errno 表达

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const BAD_GATEWAY: i32 = 502;
    pub const GATEWAY_TIMEOUT: i32 = 504;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// 上游平台失败，消息原样透传
    Upstream(String),
    Timeout(String),
    Internal(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::Upstream(_) => errno::BAD_GATEWAY,
            ApiError::Timeout(_) => errno::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Upstream(msg)
            | ApiError::Timeout(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = self.message();
        match &self {
            ApiError::NotFound(_) => tracing::warn!(errno, error = %msg, "Resource not found"),
            ApiError::BadRequest(_) => tracing::warn!(errno, error = %msg, "Bad request"),
            ApiError::Conflict(_) => tracing::warn!(errno, error = %msg, "Resource conflict"),
            ApiError::Upstream(_) => tracing::error!(errno, error = %msg, "Upstream request failed"),
            ApiError::Timeout(_) => tracing::error!(errno, error = %msg, "Upstream request timed out"),
            ApiError::Internal(_) => tracing::error!(errno, error = %msg, "Internal server error"),
        }

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::Validation(msg) => ApiError::BadRequest(msg),
            ApplicationError::Decode(msg) => ApiError::BadRequest(msg),
            ApplicationError::Busy { .. } => ApiError::Conflict(e.to_string()),
            ApplicationError::Timeout(msg) => ApiError::Timeout(msg),
            ApplicationError::Transport(msg) => ApiError::Upstream(msg),
            ApplicationError::RemoteStatus { message, status } => {
                if message.is_empty() {
                    ApiError::Upstream(format!("Upstream status {}", status))
                } else {
                    ApiError::Upstream(message)
                }
            }
            ApplicationError::GenerationFailed { .. }
            | ApplicationError::Cancelled
            | ApplicationError::Internal(_) => ApiError::Internal(e.to_string()),
        }
    }
}
