//! 水印模块
//!
//! The registration core only sees [`WatermarkApplier`]; the production
//! implementation shells out to ffmpeg ([`FfmpegWatermarker`]).

mod ffmpeg;

pub use ffmpeg::{FfmpegWatermarker, escape_drawtext};

use async_trait::async_trait;
use shared::{AppError, ErrorCode};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("Media tool '{0}' is not available")]
    ToolMissing(String),

    #[error("Font '{0}' not found and no fallback configured")]
    FontMissing(String),

    #[error("Source image not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Media tool failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WatermarkError> for AppError {
    fn from(err: WatermarkError) -> Self {
        let code = match &err {
            WatermarkError::ToolMissing(_) => ErrorCode::WatermarkToolMissing,
            WatermarkError::FontMissing(_) => ErrorCode::WatermarkFontMissing,
            WatermarkError::SourceMissing(_) => ErrorCode::ImageNotFound,
            WatermarkError::Failed { .. } => ErrorCode::WatermarkFailed,
            WatermarkError::Io(_) => ErrorCode::FileSystemError,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Burns a text label onto images
#[async_trait]
pub trait WatermarkApplier: Send + Sync {
    /// Write a labelled copy of `source` to `dest`, creating parent folders
    async fn apply(&self, source: &Path, dest: &Path, label: &str) -> Result<(), WatermarkError>;

    /// Delete a previously written output; a missing file is not an error
    async fn remove(&self, dest: &Path) -> Result<(), WatermarkError> {
        match tokio::fs::remove_file(dest).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
