//! Error types for the fixture fetchers

use thiserror::Error;

/// Errors that can occur while fetching fixtures or team history
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Failed to parse page: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;
