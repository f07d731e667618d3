//! Shared types for the batch workspace
//!
//! Common types used by `album-fetcher` and `batch-server`: the on-disk
//! layout helpers, domain models and the unified error/response types.

pub mod error;
pub mod layout;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
