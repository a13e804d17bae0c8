//! Contract between the integration core and the banking platform client.
//!
//! The HTTP client crate implements [`BankingProvider`]; everything in the
//! core works against normalized records so wire formats stay out of the
//! domain logic.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::payments::PaymentStatus;
use crate::transactions::TransactionState;
use crate::Result;

/// Token pair returned by the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access-token lifetime in seconds, when the provider supplies one.
    pub expires_in: Option<i64>,
    /// Refresh-token lifetime in seconds, when the provider supplies one.
    pub refresh_expires_in: Option<i64>,
}

/// Bank account normalized from the provider payload.
#[derive(Debug, Clone)]
pub struct ProviderAccount {
    pub external_id: String,
    pub name: String,
    pub iban: Option<String>,
    pub balance: Decimal,
    pub currency: String,
    pub account_kind: Option<String>,
}

/// Bank transaction normalized from the provider payload.
#[derive(Debug, Clone)]
pub struct ProviderTransaction {
    pub external_id: String,
    /// Provider-scoped id of the owning account.
    pub account_external_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub state: TransactionState,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub booked_at: Option<String>,
}

/// Outbound payment order submitted to the provider.
#[derive(Debug, Clone)]
pub struct PaymentOrder {
    /// Locally assigned idempotency key.
    pub request_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_name: String,
    pub counterparty_iban: String,
    pub description: Option<String>,
}

/// Provider-assigned view of a submitted payment.
#[derive(Debug, Clone)]
pub struct ProviderPayment {
    pub external_id: String,
    pub status: PaymentStatus,
}

/// Operations the integration needs from the banking platform.
#[async_trait]
pub trait BankingProvider: Send + Sync {
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant>;

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant>;

    async fn list_accounts(&self, access_token: &str) -> Result<Vec<ProviderAccount>>;

    /// List transactions booked inside `[from, to]` (RFC3339 bounds), capped
    /// at `limit` records on the provider side.
    async fn list_transactions(
        &self,
        access_token: &str,
        from: &str,
        to: &str,
        limit: i64,
    ) -> Result<Vec<ProviderTransaction>>;

    async fn submit_payment(
        &self,
        access_token: &str,
        order: &PaymentOrder,
    ) -> Result<ProviderPayment>;
}
