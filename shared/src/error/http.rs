//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CollectionNotFound
            | Self::ProductNotFound
            | Self::ImageNotFound
            | Self::SessionNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists | Self::CommitInProgress | Self::BatchAlreadyProcessed => {
                StatusCode::CONFLICT
            }

            // 403 Forbidden
            Self::InvalidImagePath => StatusCode::FORBIDDEN,

            // 422 Unprocessable (request is well-formed but the batch is not ready)
            Self::IncompleteAnnotations | Self::NothingToProcess => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 502 Bad Gateway (external collaborator failed)
            Self::WatermarkFailed | Self::PublishFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient or environment errors)
            Self::NetworkError
            | Self::TimeoutError
            | Self::WatermarkToolMissing
            | Self::WatermarkFontMissing
            | Self::PublishNotConfigured => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::FileSystemError
            | Self::TitleCatalogUnavailable => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_statuses() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::SessionNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::CollectionNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_registration_statuses() {
        assert_eq!(
            ErrorCode::PositionOutOfRange.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::IncompleteAnnotations.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::CommitInProgress.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::BatchAlreadyProcessed.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_processing_statuses() {
        assert_eq!(
            ErrorCode::WatermarkToolMissing.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ErrorCode::WatermarkFailed.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::InvalidImagePath.http_status(),
            StatusCode::FORBIDDEN
        );
    }
}
