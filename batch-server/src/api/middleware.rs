//! 请求日志中间件
//!
//! 记录所有进入的 HTTP 请求，包含请求 ID、路径和状态码

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// 请求日志中间件
///
/// - 请求 ID (x-request-id)
/// - HTTP 方法和路径
/// - 响应状态码
/// - 请求延迟 (毫秒)
///
/// 图片与静态页面请求只在 debug 级别记录
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let is_api = path.starts_with("/api/");

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        warn!(
            target: "http_access",
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() && is_api {
        warn!(
            target: "http_access",
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            "Request completed with client error"
        );
    } else if is_api {
        info!(
            target: "http_access",
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            "Request completed"
        );
    } else {
        debug!(target: "http_access", method = %method, path = %path, status = %status.as_u16(), "Static request");
    }

    response
}
