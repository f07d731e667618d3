use thiserror::Error;

/// Fetcher errors
///
/// Per-image and per-product failures are logged and counted by the runner;
/// only configuration problems and a failed password check abort a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid collection list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid page range: {start}..={end}")]
    InvalidRange { start: u32, end: u32 },

    #[error("Password rejected for {0}")]
    AuthFailed(String),
}

pub type FetchResult<T> = Result<T, FetchError>;
