//! Mirrored bank transactions.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::providers::ProviderTransaction;
use crate::Result;

/// Lifecycle of a mirrored transaction. `Booked` and `Cancelled` are
/// terminal; later updates must not regress a terminal state to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Pending,
    Booked,
    Cancelled,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Booked | TransactionState::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Pending => "pending",
            TransactionState::Booked => "booked",
            TransactionState::Cancelled => "cancelled",
        }
    }

    /// Parse a wire-form state. Unknown values return `None` so callers can
    /// decide whether to skip or default.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(TransactionState::Pending),
            "booked" => Some(TransactionState::Booked),
            "cancelled" => Some(TransactionState::Cancelled),
            _ => None,
        }
    }
}

/// Local mirror of an externally-owned transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: String,
    pub tenant_id: String,
    pub external_id: String,
    /// Local id of the owning mirrored account.
    pub account_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub state: TransactionState,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub booked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Upsert payload keyed by (tenant, external transaction id).
#[derive(Debug, Clone)]
pub struct TransactionUpsert {
    pub tenant_id: String,
    pub external_id: String,
    pub account_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub state: TransactionState,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub booked_at: Option<String>,
}

impl TransactionUpsert {
    pub fn from_provider(
        tenant_id: &str,
        account_id: &str,
        transaction: ProviderTransaction,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            external_id: transaction.external_id,
            account_id: account_id.to_string(),
            amount: transaction.amount,
            currency: transaction.currency,
            state: transaction.state,
            description: transaction.description,
            counterparty: transaction.counterparty,
            booked_at: transaction.booked_at,
        }
    }
}

/// Outcome of applying a state change to a mirrored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateApplyOutcome {
    Applied,
    /// Row exists but the change would regress a terminal state.
    SkippedTerminal,
    /// No mirrored row; the transaction may sync later.
    Missing,
}

#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Insert or update keyed by (tenant, external id). Terminal states are
    /// preserved when the incoming payload reports a non-terminal one.
    async fn upsert_transaction(&self, upsert: TransactionUpsert) -> Result<BankTransaction>;

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<BankTransaction>>;

    fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<BankTransaction>>;

    /// Apply a state reported by the provider to the mirrored row.
    async fn apply_state_by_external_id(
        &self,
        external_id: &str,
        state: TransactionState,
    ) -> Result<StateApplyOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TransactionState::Pending.is_terminal());
        assert!(TransactionState::Booked.is_terminal());
        assert!(TransactionState::Cancelled.is_terminal());
    }

    #[test]
    fn wire_parsing_rejects_unknown_states() {
        assert_eq!(TransactionState::from_wire("Booked"), Some(TransactionState::Booked));
        assert_eq!(TransactionState::from_wire("reversed"), None);
    }
}
