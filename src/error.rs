//! Error types for the signatory feed client

use thiserror::Error;

/// Feed client error
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A `signed` value that is neither epoch millis nor an RFC 3339 date
    #[error("Invalid signing timestamp: {0}")]
    InvalidTimestamp(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A login popup closed without completing
    #[error("Login with {0} abandoned")]
    LoginAbandoned(String),

    /// The controller task is gone
    #[error("Controller closed")]
    ControllerClosed,
}

impl From<toml::de::Error> for FeedError {
    fn from(e: toml::de::Error) -> Self {
        FeedError::Config(e.to_string())
    }
}

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
