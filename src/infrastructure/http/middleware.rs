//! HTTP Middleware
//!
//! 传输层错误日志：4xx/5xx 状态码与慢请求

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::{Duration, Instant};

/// 超过该耗时的成功请求记为慢请求（视频轮询以外的上游调用通常在此之内）
const SLOW_REQUEST: Duration = Duration::from_secs(30);

/// HTTP 状态码错误日志中间件
///
/// 业务错误（errno != 0）以 200 返回，在 ApiError::into_response() 中记录；
/// 这里只处理框架层面的拒绝（JSON 解析失败、请求体过大等）
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else if started.elapsed() > SLOW_REQUEST {
        tracing::warn!(method = %method, uri = %uri, elapsed_ms, "Slow request");
    }

    response
}
