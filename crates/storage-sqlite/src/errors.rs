//! Error types for SQLite storage.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("Background write failed: {0}")]
    Task(String),
}

impl From<StorageError> for invoice_sync_core::Error {
    fn from(err: StorageError) -> Self {
        invoice_sync_core::Error::storage(err.to_string())
    }
}
