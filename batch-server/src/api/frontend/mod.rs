//! 内嵌前端
//!
//! The pages under `batch-server/frontend/` are compiled into the binary.
//! Anything no other route matches is looked up here.

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::get,
};
use http::{Uri, header};
use include_dir::{Dir, include_dir};
use shared::{AppError, AppResult};

use crate::core::ServerState;

static FRONTEND: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/frontend");

pub fn router() -> Router<ServerState> {
    Router::new().route("/", get(index))
}

fn serve(file: &str) -> AppResult<Response> {
    let entry = FRONTEND
        .get_file(file)
        .ok_or_else(|| AppError::not_found(file.to_string()))?;
    let mime = mime_guess::from_path(file).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], entry.contents()).into_response())
}

/// GET / - 登记页面
async fn index() -> AppResult<Response> {
    serve("index.html")
}

/// 其他路径 - 静态资源
pub async fn fallback(uri: Uri) -> AppResult<Response> {
    let file = uri.path().trim_start_matches('/');
    if file.is_empty() {
        return serve("index.html");
    }
    serve(file)
}
