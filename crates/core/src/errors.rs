//! Error types shared across the banking integration.

use thiserror::Error;

use crate::vault::VaultError;

/// Result type alias for integration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the banking integration core.
#[derive(Debug, Error)]
pub enum Error {
    /// Integration credentials are absent from configuration.
    #[error("banking integration is not configured")]
    NotConfigured,

    /// Caller lacks the tenant's administrative role.
    #[error("caller lacks the required role")]
    Forbidden,

    /// The tenant already has an active bank connection.
    #[error("an active bank connection already exists")]
    AlreadyConnected,

    /// No active connection exists for the tenant.
    #[error("no active bank connection")]
    NoConnection,

    /// Callback request is missing required parameters.
    #[error("authorization callback is missing required parameters")]
    InvalidCallback,

    /// Returned state does not match the pending authorization.
    #[error("authorization state does not match the pending request")]
    StateMismatch,

    /// The pending authorization expired or was already consumed.
    #[error("authorization session expired or was already used")]
    SessionExpired,

    /// The provider rejected a refresh-token exchange.
    #[error("token refresh rejected: {0}")]
    RefreshFailed(String),

    /// Authenticated decryption or signature verification failed.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// Request rejected before reaching the provider.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The external provider failed, timed out or returned an error body.
    #[error("provider request failed: {0}")]
    Provider(String),

    /// Storage layer failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<VaultError> for Error {
    fn from(err: VaultError) -> Self {
        Error::Integrity(err.to_string())
    }
}
