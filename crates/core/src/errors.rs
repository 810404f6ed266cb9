//! Error types for the invoice sync core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core pipeline.
///
/// Fetch-level failures never become an `Error`: they are logged and turned
/// into partial or empty results. What remains here is configuration and
/// the load stage, both fatal to a run.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential set could not be parsed or is empty
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// Failure reported by an invoice provider for a whole credential
    #[error("Provider error: {0}")]
    Provider(String),

    /// Destination table write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A background task could not be scheduled or joined
    #[error("Task error: {0}")]
    Task(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }

}
