//! Connection lifecycle operations: authorize, callback, disconnect, and
//! valid-token retrieval for internal callers.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::membership::Membership;
use crate::providers::{BankingProvider, TokenGrant};
use crate::vault::TokenVault;
use crate::{Error, Result};

use super::{
    Connection, ConnectionRepositoryTrait, ConnectionStatus, NewConnection, OAuthStateBinding,
    TokenUpdate,
};

/// Lifetime of a pending authorization binding.
const STATE_LIFETIME_MINUTES: i64 = 10;

/// Random bytes behind the opaque state token.
const STATE_TOKEN_BYTES: usize = 32;

/// Access-token lifetime assumed when the provider omits `expires_in`.
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Refresh-token lifetime assumed when the provider omits one.
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 90;

/// Static integration credentials; absent when the integration is disabled.
#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub client_id: String,
    pub redirect_uri: String,
    /// Provider consent endpoint the browser is sent to.
    pub authorize_endpoint: String,
}

/// Result of a disconnect request.
#[derive(Debug, Clone, Copy)]
pub struct DisconnectOutcome {
    pub data_deleted: bool,
}

pub struct ConnectionService {
    repo: Arc<dyn ConnectionRepositoryTrait>,
    provider: Arc<dyn BankingProvider>,
    vault: Arc<TokenVault>,
    settings: Option<IntegrationSettings>,
}

impl ConnectionService {
    pub fn new(
        repo: Arc<dyn ConnectionRepositoryTrait>,
        provider: Arc<dyn BankingProvider>,
        vault: Arc<TokenVault>,
        settings: Option<IntegrationSettings>,
    ) -> Self {
        Self {
            repo,
            provider,
            vault,
            settings,
        }
    }

    fn settings(&self) -> Result<&IntegrationSettings> {
        self.settings.as_ref().ok_or(Error::NotConfigured)
    }

    fn ensure_owner(membership: &Membership) -> Result<()> {
        if membership.is_owner() {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Current status for the tenant's settings surface.
    pub fn status(&self, tenant_id: &str) -> Result<ConnectionStatus> {
        Ok(self
            .repo
            .find_by_tenant(tenant_id)?
            .map(|c| c.status)
            .unwrap_or(ConnectionStatus::None))
    }

    /// Start the authorization flow and return the provider consent URL.
    pub async fn initiate(&self, membership: &Membership) -> Result<String> {
        Self::ensure_owner(membership)?;
        let settings = self.settings()?;

        if let Some(existing) = self.repo.find_by_tenant(&membership.tenant_id)? {
            if existing.is_active() {
                return Err(Error::AlreadyConnected);
            }
        }

        let state = generate_state_token();
        let now = Utc::now();
        self.repo
            .put_state_binding(OAuthStateBinding {
                tenant_id: membership.tenant_id.clone(),
                state: state.clone(),
                created_at: now.to_rfc3339(),
                expires_at: (now + chrono::Duration::minutes(STATE_LIFETIME_MINUTES)).to_rfc3339(),
            })
            .await?;

        log::info!(
            "[Banking] authorization initiated for tenant {}",
            membership.tenant_id
        );

        Ok(format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&state={}",
            settings.authorize_endpoint,
            urlencoding::encode(&settings.client_id),
            urlencoding::encode(&settings.redirect_uri),
            urlencoding::encode(&state),
        ))
    }

    /// Complete the flow with the `code`/`state` pair from the provider
    /// redirect and store a fresh active connection.
    pub async fn complete_callback(
        &self,
        membership: &Membership,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<Connection> {
        Self::ensure_owner(membership)?;
        let settings = self.settings()?;

        let (code, state) = match (code, state) {
            (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => (code, state),
            _ => return Err(Error::InvalidCallback),
        };

        // The binding is consumed before anything else, so a replayed
        // callback with the same pair cannot pass a second time.
        let binding = self
            .repo
            .consume_state_binding(&membership.tenant_id)
            .await?
            .ok_or(Error::SessionExpired)?;

        if binding.is_expired(Utc::now()) {
            return Err(Error::SessionExpired);
        }
        if binding.state != state {
            return Err(Error::StateMismatch);
        }

        let grant = self
            .provider
            .exchange_authorization_code(code, &settings.redirect_uri)
            .await?;

        let connection = self
            .repo
            .replace_for_tenant(self.new_connection(&membership.tenant_id, &grant)?)
            .await?;

        log::info!(
            "[Banking] connection established for tenant {}",
            membership.tenant_id
        );
        Ok(connection)
    }

    /// Disconnect the tenant. Revoke-only by default; `purge` also drops all
    /// mirrored data.
    pub async fn disconnect(
        &self,
        membership: &Membership,
        purge: bool,
    ) -> Result<DisconnectOutcome> {
        Self::ensure_owner(membership)?;

        if self.repo.find_by_tenant(&membership.tenant_id)?.is_none() {
            return Err(Error::NoConnection);
        }

        if purge {
            self.repo.purge(&membership.tenant_id).await?;
            log::info!(
                "[Banking] connection and mirrored data purged for tenant {}",
                membership.tenant_id
            );
            Ok(DisconnectOutcome { data_deleted: true })
        } else {
            self.repo.revoke(&membership.tenant_id).await?;
            log::info!(
                "[Banking] connection revoked for tenant {}",
                membership.tenant_id
            );
            Ok(DisconnectOutcome {
                data_deleted: false,
            })
        }
    }

    /// Return a decrypted, non-expired access token, refreshing first when
    /// needed. Expired tokens are never handed out.
    pub async fn get_valid_token(&self, tenant_id: &str) -> Result<String> {
        let connection = self
            .repo
            .find_by_tenant(tenant_id)?
            .filter(Connection::is_active)
            .ok_or(Error::NoConnection)?;

        if !connection.access_token_expired(Utc::now()) {
            return Ok(self.vault.decrypt(&connection.access_token_enc)?);
        }

        let refresh_token = self.vault.decrypt(&connection.refresh_token_enc)?;
        let grant = match self.provider.refresh_access_token(&refresh_token).await {
            Ok(grant) => grant,
            Err(err) => {
                // Degrade the connection so the settings surface prompts a
                // reconnect instead of retrying a dead refresh token.
                log::error!("[Banking] token refresh failed for tenant {}: {}", tenant_id, err);
                self.repo.revoke(tenant_id).await?;
                return Err(Error::RefreshFailed(err.to_string()));
            }
        };

        let update = self.token_update(&grant, &connection)?;
        self.repo.store_tokens(tenant_id, update).await?;

        log::debug!("[Banking] access token refreshed for tenant {}", tenant_id);
        Ok(grant.access_token)
    }

    fn new_connection(&self, tenant_id: &str, grant: &TokenGrant) -> Result<NewConnection> {
        let now = Utc::now();
        Ok(NewConnection {
            tenant_id: tenant_id.to_string(),
            access_token_enc: self.vault.encrypt(&grant.access_token)?,
            refresh_token_enc: self.vault.encrypt(&grant.refresh_token)?,
            token_type: grant.token_type.clone(),
            access_expires_at: (now
                + chrono::Duration::seconds(
                    grant.expires_in.unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS),
                ))
            .to_rfc3339(),
            refresh_expires_at: (now
                + grant
                    .refresh_expires_in
                    .map(chrono::Duration::seconds)
                    .unwrap_or_else(|| chrono::Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS)))
            .to_rfc3339(),
        })
    }

    fn token_update(&self, grant: &TokenGrant, previous: &Connection) -> Result<TokenUpdate> {
        let now = Utc::now();
        Ok(TokenUpdate {
            access_token_enc: self.vault.encrypt(&grant.access_token)?,
            refresh_token_enc: self.vault.encrypt(&grant.refresh_token)?,
            token_type: grant.token_type.clone(),
            access_expires_at: (now
                + chrono::Duration::seconds(
                    grant.expires_in.unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS),
                ))
            .to_rfc3339(),
            // Keep the previous window when the provider does not restate it.
            refresh_expires_at: match grant.refresh_expires_in {
                Some(secs) => (now + chrono::Duration::seconds(secs)).to_rfc3339(),
                None => previous.refresh_expires_at.clone(),
            },
        })
    }
}

/// Cryptographically random opaque state token, URL-safe without padding.
fn generate_state_token() -> String {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
