//! Report API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/report", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).delete(handler::clear))
        .route("/summary", get(handler::summary))
        .route("/export", get(handler::export))
}
