use shared::{AppError, ErrorCode};
use thiserror::Error;

use super::state::IncompleteEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Position {position} out of range ({len} products)")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Image {image} out of range for position {position} ({count} images)")]
    ImageIndexOutOfRange {
        position: usize,
        image: usize,
        count: usize,
    },

    #[error("Page {page} out of range ({total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    #[error("{} products are missing required fields", .0.len())]
    Incomplete(Vec<IncompleteEntry>),

    /// Positions whose selection changed since the last preview
    #[error("Preview the batch before processing it")]
    NotPreviewed(Vec<usize>),

    #[error("Page {page} was already processed")]
    AlreadyPublished { page: usize },
}

pub type RegistrationResult<T> = Result<T, RegistrationError>;

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        let message = err.to_string();
        match err {
            RegistrationError::PositionOutOfRange { position, len } => {
                AppError::with_message(ErrorCode::PositionOutOfRange, message)
                    .with_detail("position", position)
                    .with_detail("len", len)
            }
            RegistrationError::ImageIndexOutOfRange {
                position,
                image,
                count,
            } => AppError::with_message(ErrorCode::ImageIndexOutOfRange, message)
                .with_detail("position", position)
                .with_detail("image", image)
                .with_detail("count", count),
            RegistrationError::PageOutOfRange { page, total } => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message)
                    .with_detail("page", page)
                    .with_detail("total_pages", total)
            }
            RegistrationError::Incomplete(entries) => {
                let incomplete = serde_json::to_value(&entries).unwrap_or_default();
                AppError::with_message(ErrorCode::IncompleteAnnotations, message)
                    .with_detail("incomplete", incomplete)
            }
            RegistrationError::NotPreviewed(positions) => {
                AppError::with_message(ErrorCode::NothingToProcess, message)
                    .with_detail("positions", positions)
            }
            RegistrationError::AlreadyPublished { page } => {
                AppError::with_message(ErrorCode::BatchAlreadyProcessed, message)
                    .with_detail("page", page)
            }
        }
    }
}
