//! Error types for the Pennylane client.

use thiserror::Error;

/// Result type alias for Pennylane client operations.
pub type Result<T> = std::result::Result<T, PennylaneError>;

/// Errors that can occur while talking to the Pennylane API.
#[derive(Debug, Error)]
pub enum PennylaneError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Every allowed attempt was answered with a retryable status
    #[error("Max retries exceeded after {attempts} attempts (last status {status})")]
    RetriesExhausted { attempts: u32, status: u16 },

    /// Authentication error (token cannot be sent as a header)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl PennylaneError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

impl From<PennylaneError> for invoice_sync_core::Error {
    fn from(err: PennylaneError) -> Self {
        invoice_sync_core::Error::provider(err.to_string())
    }
}
