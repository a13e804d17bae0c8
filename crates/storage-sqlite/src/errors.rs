//! Storage error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("writer thread is unavailable")]
    WriterUnavailable,
}

impl From<StorageError> for ledgerdesk_core::Error {
    fn from(err: StorageError) -> Self {
        ledgerdesk_core::Error::Storage(err.to_string())
    }
}
