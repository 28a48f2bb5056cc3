//! Error types for the WordPress client.

use thiserror::Error;

/// Result type for WordPress client operations.
pub type Result<T> = std::result::Result<T, WordPressError>;

/// WordPress client errors.
#[derive(Debug, Error)]
pub enum WordPressError {
    /// Configuration error (bad base URL, missing credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response from the REST API)
    #[error("WordPress API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (unexpected response shape, bad media source)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WordPressError {
    fn from(err: reqwest::Error) -> Self {
        WordPressError::Network(err.to_string())
    }
}
