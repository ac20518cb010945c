//! Error types for the match service

use fixture_fetcher::FetchError;
use thiserror::Error;

/// Errors that can occur in the match service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while writing a CSV export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

/// Result type for match service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
