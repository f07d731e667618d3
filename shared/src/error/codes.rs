//! Unified error codes
//!
//! This module defines all error codes used across batch-server and the frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 6xxx: Catalog errors
//! - 7xxx: Registration errors
//! - 8xxx: Processing errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, JavaScript)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 6xxx: Catalog ====================
    /// Collection not found under the download root
    CollectionNotFound = 6001,
    /// Product not found in the collection
    ProductNotFound = 6002,
    /// Title catalog could not be read
    TitleCatalogUnavailable = 6003,
    /// Image file not found
    ImageNotFound = 6101,
    /// Image path escapes its root directory
    InvalidImagePath = 6102,

    // ==================== 7xxx: Registration ====================
    /// Registration session not found
    SessionNotFound = 7001,
    /// No collection selected for the session
    NoCollectionSelected = 7002,
    /// Position is outside the product list
    PositionOutOfRange = 7003,
    /// Image index is outside the product's image list
    ImageIndexOutOfRange = 7004,
    /// Positions in the batch are missing title, color or primary image
    IncompleteAnnotations = 7005,
    /// A commit of this session is already running
    CommitInProgress = 7006,
    /// Batch has no preview to confirm
    NothingToProcess = 7007,
    /// Every product of the batch was already published
    BatchAlreadyProcessed = 7008,

    // ==================== 8xxx: Processing ====================
    /// External media tool is not installed
    WatermarkToolMissing = 8001,
    /// Watermark font missing and no fallback configured
    WatermarkFontMissing = 8002,
    /// Watermark tool exited with an error
    WatermarkFailed = 8003,
    /// Storefront publishing is not configured
    PublishNotConfigured = 8101,
    /// Storefront publishing failed
    PublishFailed = 8102,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Filesystem error
    FileSystemError = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Catalog
            ErrorCode::CollectionNotFound => "Collection not found",
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::TitleCatalogUnavailable => "Title catalog is unavailable",
            ErrorCode::ImageNotFound => "Image not found",
            ErrorCode::InvalidImagePath => "Access denied",

            // Registration
            ErrorCode::SessionNotFound => "Session not found",
            ErrorCode::NoCollectionSelected => "No collection selected",
            ErrorCode::PositionOutOfRange => "Position is out of range",
            ErrorCode::ImageIndexOutOfRange => "Image index is out of range",
            ErrorCode::IncompleteAnnotations => "Batch has incomplete products",
            ErrorCode::CommitInProgress => "A commit is already in progress",
            ErrorCode::NothingToProcess => "Batch has not been previewed",
            ErrorCode::BatchAlreadyProcessed => "Batch was already processed",

            // Processing
            ErrorCode::WatermarkToolMissing => "Watermark tool is not installed",
            ErrorCode::WatermarkFontMissing => "Watermark font is not available",
            ErrorCode::WatermarkFailed => "Watermark could not be applied",
            ErrorCode::PublishNotConfigured => "Publishing is not configured",
            ErrorCode::PublishFailed => "Publishing failed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::FileSystemError => "Filesystem error",
        }
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Catalog
            6001 => Ok(ErrorCode::CollectionNotFound),
            6002 => Ok(ErrorCode::ProductNotFound),
            6003 => Ok(ErrorCode::TitleCatalogUnavailable),
            6101 => Ok(ErrorCode::ImageNotFound),
            6102 => Ok(ErrorCode::InvalidImagePath),

            // Registration
            7001 => Ok(ErrorCode::SessionNotFound),
            7002 => Ok(ErrorCode::NoCollectionSelected),
            7003 => Ok(ErrorCode::PositionOutOfRange),
            7004 => Ok(ErrorCode::ImageIndexOutOfRange),
            7005 => Ok(ErrorCode::IncompleteAnnotations),
            7006 => Ok(ErrorCode::CommitInProgress),
            7007 => Ok(ErrorCode::NothingToProcess),
            7008 => Ok(ErrorCode::BatchAlreadyProcessed),

            // Processing
            8001 => Ok(ErrorCode::WatermarkToolMissing),
            8002 => Ok(ErrorCode::WatermarkFontMissing),
            8003 => Ok(ErrorCode::WatermarkFailed),
            8101 => Ok(ErrorCode::PublishNotConfigured),
            8102 => Ok(ErrorCode::PublishFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::FileSystemError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
