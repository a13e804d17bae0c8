//! Database model for the invoice boundary.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerdesk_core::invoices::{Invoice, InvoiceStatus};

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
#[diesel(table_name = crate::schema::invoices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InvoiceDB {
    pub id: String,
    pub tenant_id: String,
    pub status: String,
    pub total: String,
    pub currency: String,
    pub paid_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<InvoiceDB> for Invoice {
    fn from(db: InvoiceDB) -> Self {
        Invoice {
            id: db.id,
            tenant_id: db.tenant_id,
            status: match db.status.as_str() {
                "paid" => InvoiceStatus::Paid,
                _ => InvoiceStatus::Open,
            },
            total: db.total.parse().unwrap_or_default(),
            currency: db.currency,
            paid_at: db.paid_at,
        }
    }
}
