//! 商品目录
//!
//! - [`CatalogReader`] - 读取抓取工具的输出目录
//! - [`TitleCatalog`] - 标题 CSV

mod reader;
mod titles;

pub use reader::CatalogReader;
pub use titles::TitleCatalog;

/// URL prefix under which source images are served
pub const DOWNLOADS_PREFIX: &str = "downloads";

use shared::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Invalid collection name: {0}")]
    InvalidName(String),

    #[error("Title catalog has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("Invalid title id '{value}' on line {line}")]
    InvalidId { line: u64, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CollectionNotFound(name) => AppError::collection_not_found(name),
            CatalogError::InvalidName(name) => AppError::forbidden_path(name),
            CatalogError::Io(e) => AppError::filesystem(e.to_string()),
            other => AppError::with_message(ErrorCode::TitleCatalogUnavailable, other.to_string()),
        }
    }
}
