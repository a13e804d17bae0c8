//! Database model for outbound payments.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerdesk_core::payments::{Payment, PaymentStatus};

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
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentDB {
    pub id: String,
    pub tenant_id: String,
    pub request_id: String,
    pub external_id: Option<String>,
    pub invoice_id: Option<String>,
    pub amount: String,
    pub currency: String,
    pub counterparty_name: String,
    pub counterparty_iban: String,
    pub description: Option<String>,
    pub status: String,
    pub reason_code: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PaymentDB> for Payment {
    fn from(db: PaymentDB) -> Self {
        Payment {
            id: db.id,
            tenant_id: db.tenant_id,
            request_id: db.request_id,
            external_id: db.external_id,
            invoice_id: db.invoice_id,
            amount: db.amount.parse().unwrap_or_default(),
            currency: db.currency,
            counterparty_name: db.counterparty_name,
            counterparty_iban: db.counterparty_iban,
            description: db.description,
            status: PaymentStatus::from_wire(&db.status).unwrap_or(PaymentStatus::Pending),
            reason_code: db.reason_code,
            completed_at: db.completed_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
