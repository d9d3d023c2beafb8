use thiserror::Error;

/// Failure talking to the analytics backend.
///
/// Nothing retries on these; the classification only decides how loudly a
/// lost report gets logged.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// 4xx: the backend rejected the report
    #[error("Client error: {message} (status: {status})")]
    ClientError { status: u16, message: String },

    /// 5xx
    #[error("Server error: {message} (status: {status})")]
    ServerError { status: u16, message: String },

    /// Timeout, refused connection, DNS...
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("API error: {0}")]
    Other(String),
}

impl ApiError {
    /// Whether the same request could plausibly succeed later
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::ServerError { .. })
    }

    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ApiError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() || error.is_builder() {
            ApiError::Network(format!("Request error: {}", error))
        } else {
            ApiError::Other(error.to_string())
        }
    }

    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400..=499 => ApiError::ClientError {
                status,
                message: body,
            },
            500..=599 => ApiError::ServerError {
                status,
                message: body,
            },
            _ => ApiError::Other(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::from_reqwest(error)
    }
}
