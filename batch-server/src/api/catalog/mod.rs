//! Catalog API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/titles", get(handler::titles))
        .route("/api/collections", get(handler::collections))
        .route("/api/products", get(handler::products))
}
