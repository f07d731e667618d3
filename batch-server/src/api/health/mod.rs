//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 健康检查 |
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "titles": 120,
//!   "publishing": false
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// 已加载的标题数
    titles: usize,
    /// 标题目录读取失败原因
    #[serde(skip_serializing_if = "Option::is_none")]
    titles_error: Option<String>,
    /// 是否启用商店发布
    publishing: bool,
}

/// GET /health - 健康检查
async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        titles: state.titles.len(),
        titles_error: state.titles_error.clone(),
        publishing: state.publisher.is_some(),
    })
}
