//! Mirrored bank accounts.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::providers::ProviderAccount;
use crate::Result;

/// Local mirror of an externally-owned bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    pub tenant_id: String,
    pub external_id: String,
    pub name: String,
    pub iban: Option<String>,
    pub balance: Decimal,
    pub currency: String,
    pub account_kind: Option<String>,
    pub balance_refreshed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Upsert payload keyed by (tenant, external account id).
#[derive(Debug, Clone)]
pub struct AccountUpsert {
    pub tenant_id: String,
    pub external_id: String,
    pub name: String,
    pub iban: Option<String>,
    pub balance: Decimal,
    pub currency: String,
    pub account_kind: Option<String>,
}

impl AccountUpsert {
    pub fn from_provider(tenant_id: &str, account: ProviderAccount) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            external_id: account.external_id,
            name: account.name,
            iban: account.iban,
            balance: account.balance,
            currency: account.currency,
            account_kind: account.account_kind,
        }
    }
}

#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    /// Insert or update the mirror row for (tenant, external id).
    async fn upsert_account(&self, upsert: AccountUpsert) -> Result<BankAccount>;

    fn list_accounts_for_tenant(&self, tenant_id: &str) -> Result<Vec<BankAccount>>;
}
