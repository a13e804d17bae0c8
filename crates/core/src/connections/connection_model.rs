//! Connection domain model and repository contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sync::SyncRunStatus;
use crate::Result;

/// Seconds before the stored expiry at which a token counts as expired,
/// buffering clock skew and request latency.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Connection lifecycle. A tenant with no row is implicitly `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    None,
    Active,
    Revoked,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::None => "none",
            ConnectionStatus::Active => "active",
            ConnectionStatus::Revoked => "revoked",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(ConnectionStatus::None),
            "active" => Some(ConnectionStatus::Active),
            "revoked" => Some(ConnectionStatus::Revoked),
            _ => None,
        }
    }
}

/// Per-tenant record of authorization state and encrypted credentials.
/// Token fields hold vault ciphertexts, never plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub tenant_id: String,
    pub status: ConnectionStatus,
    pub access_token_enc: String,
    pub refresh_token_enc: String,
    pub token_type: String,
    pub access_expires_at: String,
    pub refresh_expires_at: String,
    pub last_sync_at: Option<String>,
    pub last_sync_status: Option<SyncRunStatus>,
    pub last_sync_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Connection {
    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active
    }

    /// Whether the access token is expired at `now`, with the skew buffer
    /// applied. An unparseable expiry counts as expired so a corrupt row is
    /// refreshed rather than handed out.
    pub fn access_token_expired(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.access_expires_at) {
            Ok(expires_at) => {
                expires_at.with_timezone(&Utc) - chrono::Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS)
                    <= now
            }
            Err(_) => true,
        }
    }
}

/// Insert payload replacing any prior connection row for the tenant.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub tenant_id: String,
    pub access_token_enc: String,
    pub refresh_token_enc: String,
    pub token_type: String,
    pub access_expires_at: String,
    pub refresh_expires_at: String,
}

/// Rotated token pair written back after a refresh.
#[derive(Debug, Clone)]
pub struct TokenUpdate {
    pub access_token_enc: String,
    pub refresh_token_enc: String,
    pub token_type: String,
    pub access_expires_at: String,
    pub refresh_expires_at: String,
}

/// One-time binding between a tenant and an in-flight authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthStateBinding {
    pub tenant_id: String,
    pub state: String,
    pub created_at: String,
    pub expires_at: String,
}

impl OAuthStateBinding {
    /// An unparseable expiry counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => expires_at.with_timezone(&Utc) <= now,
            Err(_) => true,
        }
    }
}

#[async_trait]
pub trait ConnectionRepositoryTrait: Send + Sync {
    fn find_by_tenant(&self, tenant_id: &str) -> Result<Option<Connection>>;

    fn list_active(&self) -> Result<Vec<Connection>>;

    /// Delete any prior row for the tenant and insert a fresh `active` one.
    async fn replace_for_tenant(&self, new: NewConnection) -> Result<Connection>;

    async fn store_tokens(&self, tenant_id: &str, update: TokenUpdate) -> Result<()>;

    /// Status to `revoked`, both ciphertexts cleared; mirrored data stays.
    /// Returns `false` when no row exists.
    async fn revoke(&self, tenant_id: &str) -> Result<bool>;

    /// Delete the connection and all dependent mirrored data for the tenant.
    async fn purge(&self, tenant_id: &str) -> Result<bool>;

    async fn record_sync_result(
        &self,
        tenant_id: &str,
        status: SyncRunStatus,
        error: Option<String>,
    ) -> Result<()>;

    /// Store (replacing any stale one) the tenant's pending authorization.
    async fn put_state_binding(&self, binding: OAuthStateBinding) -> Result<()>;

    /// Atomically fetch-and-delete the tenant's pending authorization.
    async fn consume_state_binding(&self, tenant_id: &str) -> Result<Option<OAuthStateBinding>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_expiring_at(expiry: &str) -> Connection {
        Connection {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            status: ConnectionStatus::Active,
            access_token_enc: String::new(),
            refresh_token_enc: String::new(),
            token_type: "Bearer".to_string(),
            access_expires_at: expiry.to_string(),
            refresh_expires_at: expiry.to_string(),
            last_sync_at: None,
            last_sync_status: None,
            last_sync_error: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn expiry_applies_skew_buffer() {
        let now = DateTime::parse_from_rfc3339("2026-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let fresh = connection_expiring_at("2026-01-01T13:00:00Z");
        assert!(!fresh.access_token_expired(now));

        // 30s of runway is inside the 60s buffer.
        let nearly = connection_expiring_at("2026-01-01T12:00:30Z");
        assert!(nearly.access_token_expired(now));
    }

    #[test]
    fn unparseable_expiry_counts_as_expired() {
        let now = Utc::now();
        assert!(connection_expiring_at("garbage").access_token_expired(now));
    }
}
