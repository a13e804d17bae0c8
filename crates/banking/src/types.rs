//! Wire types for the Nordbank open-banking API.

use rust_decimal::Decimal;
use serde::Deserialize;

use ledgerdesk_core::payments::PaymentStatus;
use ledgerdesk_core::providers::{ProviderAccount, ProviderTransaction};
use ledgerdesk_core::transactions::TransactionState;

/// Error body returned by the provider on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

/// Response of the token endpoint (code exchange and refresh).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<ApiAccount>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

impl ApiAccount {
    /// Normalize into the core record. Unnamed accounts fall back to the
    /// IBAN or the provider id so the mirror row always has a label.
    pub fn into_provider_account(self) -> ProviderAccount {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.iban.clone())
            .unwrap_or_else(|| self.id.clone());
        ProviderAccount {
            external_id: self.id,
            name,
            iban: self.iban,
            balance: self.balance.unwrap_or_default(),
            currency: self.currency.unwrap_or_else(|| "EUR".to_string()),
            account_kind: self.product,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<ApiTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransaction {
    pub id: String,
    pub account_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    #[serde(default)]
    pub booked_at: Option<String>,
}

impl ApiTransaction {
    pub fn into_provider_transaction(self) -> ProviderTransaction {
        let state = self
            .status
            .as_deref()
            .map(transaction_state_from_wire)
            .unwrap_or(TransactionState::Booked);
        ProviderTransaction {
            external_id: self.id,
            account_external_id: self.account_id,
            amount: self.amount,
            currency: self.currency.unwrap_or_else(|| "EUR".to_string()),
            state,
            description: self.description,
            counterparty: self.counterparty_name,
            booked_at: self.booked_at,
        }
    }
}

/// Map the provider's transaction status vocabulary onto mirror states.
/// Unknown values are treated as pending so they can settle later.
pub fn transaction_state_from_wire(value: &str) -> TransactionState {
    match value.trim().to_ascii_lowercase().as_str() {
        "booked" | "settled" | "completed" => TransactionState::Booked,
        "cancelled" | "rejected" | "reversed" => TransactionState::Cancelled,
        _ => TransactionState::Pending,
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl PaymentResponse {
    /// A freshly accepted order without an explicit status is in flight.
    pub fn payment_status(&self) -> PaymentStatus {
        self.status
            .as_deref()
            .and_then(PaymentStatus::from_wire)
            .unwrap_or(PaymentStatus::Processing)
    }
}
