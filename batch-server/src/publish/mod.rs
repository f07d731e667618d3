//! 商品发布
//!
//! Optional storefront step of the process flow. Without configuration the
//! server runs local-only and reports the watermarked primary path instead
//! of a product URL.

mod woocommerce;

pub use woocommerce::WooCommercePublisher;

use async_trait::async_trait;
use shared::{AppError, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

/// One product to create on the storefront
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// `"<title> - <color>"`
    pub name: String,
    pub primary: PathBuf,
    pub gallery: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Image upload failed for {file}: {reason}")]
    Upload { file: String, reason: String },

    #[error("Could not duplicate base product: {0}")]
    Duplicate(String),

    #[error("Could not update product {id}: {reason}")]
    Update { id: u64, reason: String },

    #[error("Unexpected storefront response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        AppError::with_message(ErrorCode::PublishFailed, err.to_string())
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create the product and return its public URL
    async fn publish(&self, request: &PublishRequest) -> Result<String, PublishError>;
}
