//! Database model for mirrored bank transactions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerdesk_core::transactions::{BankTransaction, TransactionState};

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
#[diesel(table_name = crate::schema::bank_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BankTransactionDB {
    pub id: String,
    pub tenant_id: String,
    pub external_id: String,
    pub account_id: String,
    pub amount: String,
    pub currency: String,
    pub state: String,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub booked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BankTransactionDB> for BankTransaction {
    fn from(db: BankTransactionDB) -> Self {
        BankTransaction {
            id: db.id,
            tenant_id: db.tenant_id,
            external_id: db.external_id,
            account_id: db.account_id,
            amount: db.amount.parse().unwrap_or_default(),
            currency: db.currency,
            state: TransactionState::from_wire(&db.state).unwrap_or(TransactionState::Pending),
            description: db.description,
            counterparty: db.counterparty,
            booked_at: db.booked_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
