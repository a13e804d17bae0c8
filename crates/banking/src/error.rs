//! Error types for the banking API client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, BankingApiError>;

/// Errors that can occur while talking to the banking platform.
#[derive(Debug, Error)]
pub enum BankingApiError {
    /// HTTP transport error (includes timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the provider
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl BankingApiError {
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

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<BankingApiError> for ledgerdesk_core::Error {
    fn from(err: BankingApiError) -> Self {
        ledgerdesk_core::Error::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_for_api_errors() {
        assert_eq!(BankingApiError::api(502, "bad gateway").status_code(), Some(502));
        assert_eq!(BankingApiError::auth("no token").status_code(), None);
    }
}
