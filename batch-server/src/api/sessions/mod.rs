//! Registration session API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/sessions/{id}/collection | POST | 打开/切换系列 |
//! | /api/sessions/{id} | GET | 当前批次视图 (?page=) |
//! | /api/sessions/{id}/commands | POST | 执行一条登记命令 |
//! | /api/sessions/{id}/incomplete | GET | 批次缺失字段 (?page=) |
//! | /api/sessions/{id}/preview | POST | 提交当前批次并预览 |
//! | /api/sessions/{id}/process | POST | 确认批次：发布、写报告、翻页 |

mod handler;
mod view;

pub use view::{CommandResponse, SessionView, SlotView};

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", get(handler::get_session))
        .route("/{id}/collection", post(handler::open_collection))
        .route("/{id}/commands", post(handler::apply_command))
        .route("/{id}/incomplete", get(handler::incomplete))
        .route("/{id}/preview", post(handler::preview))
        .route("/{id}/process", post(handler::process))
}
