//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`catalog`] - 标题、系列、商品
//! - [`sessions`] - 登记会话、预览、处理
//! - [`report`] - 处理报告
//! - [`files`] - 原图与水印图
//! - [`frontend`] - 内嵌前端页面

pub mod catalog;
pub mod files;
pub mod frontend;
pub mod health;
pub mod middleware;
pub mod report;
pub mod sessions;

use axum::middleware as axum_middleware;
use axum::{Json, Router};
use serde::Serialize;
use shared::{ApiResponse, AppResult};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Handler result wrapped in [`ApiResponse`]
pub type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;

/// Wrap data in a success response
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(catalog::router())
        .merge(sessions::router())
        .merge(report::router())
        .merge(files::router())
        .merge(frontend::router())
        .fallback(frontend::fallback)
}

/// Build a fully configured application with all middleware and state
///
/// Used by both the HTTP server and the integration tests
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::x_request_id())
        // Request ID - outermost, so every inner layer sees it
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
