//! Database model for mirrored bank accounts.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerdesk_core::accounts::BankAccount;

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::bank_accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BankAccountDB {
    pub id: String,
    pub tenant_id: String,
    pub external_id: String,
    pub name: String,
    pub iban: Option<String>,
    pub balance: String,
    pub currency: String,
    pub account_kind: Option<String>,
    pub balance_refreshed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BankAccountDB> for BankAccount {
    fn from(db: BankAccountDB) -> Self {
        BankAccount {
            id: db.id,
            tenant_id: db.tenant_id,
            external_id: db.external_id,
            name: db.name,
            iban: db.iban,
            balance: db.balance.parse().unwrap_or_default(),
            currency: db.currency,
            account_kind: db.account_kind,
            balance_refreshed_at: db.balance_refreshed_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
