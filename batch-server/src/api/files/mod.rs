//! 图片文件路由
//!
//! | 路径 | 说明 |
//! |------|------|
//! | /downloads/{*path} | 抓取的原图 |
//! | /watermarked/{*path} | 水印图 |
//!
//! Paths are checked with [`is_safe_relative`] before touching the disk;
//! only image files are served.

use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use http::header;
use shared::layout::{is_image_file, is_safe_relative};
use shared::{AppError, AppResult, ErrorCode};
use std::path::Path as FsPath;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/downloads/{*path}", get(download))
        .route("/watermarked/{*path}", get(watermarked))
}

async fn serve_image(root: &FsPath, path: &str) -> AppResult<Response> {
    if !is_safe_relative(path) || !is_image_file(path) {
        tracing::warn!(path = %path, "Rejected image path");
        return Err(AppError::forbidden_path(path));
    }

    let file_path = root.join(path);
    let content = match tokio::fs::read(&file_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::new(ErrorCode::ImageNotFound).with_detail("path", path));
        }
        Err(e) => return Err(AppError::filesystem(e.to_string())),
    };

    let mime = mime_guess::from_path(&file_path).first_or_octet_stream();
    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        content,
    )
        .into_response())
}

/// GET /downloads/{*path} - 原图
async fn download(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    serve_image(&state.config.download_root, &path).await
}

/// GET /watermarked/{*path} - 水印图
async fn watermarked(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    serve_image(&state.config.watermark_root, &path).await
}
