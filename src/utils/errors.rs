use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Network error: {0}")]
    Network(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session task failed: {0}")]
    SessionTask(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
