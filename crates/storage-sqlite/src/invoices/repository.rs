use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use rust_decimal::Decimal;
use uuid::Uuid;

use ledgerdesk_core::invoices::{Invoice, InvoiceStatus, InvoiceStatusPort};
use ledgerdesk_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::invoices;

use super::model::InvoiceDB;

pub struct InvoiceRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl InvoiceRepository {
    pub fn new(
        pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        InvoiceRepository { pool, writer }
    }

    /// Seed an open invoice. Invoice authoring lives in the wider
    /// application; this exists for wiring and tests.
    pub async fn create_invoice(
        &self,
        tenant: &str,
        total: Decimal,
        currency: &str,
    ) -> Result<Invoice> {
        let tenant = tenant.to_string();
        let currency = currency.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Invoice> {
                let now = Utc::now().to_rfc3339();
                let row = InvoiceDB {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: tenant,
                    status: InvoiceStatus::Open.as_str().to_string(),
                    total: total.to_string(),
                    currency,
                    paid_at: None,
                    created_at: now.clone(),
                    updated_at: now,
                };

                let inserted = diesel::insert_into(invoices::table)
                    .values(&row)
                    .returning(InvoiceDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(Invoice::from(inserted))
            })
            .await
    }
}

#[async_trait]
impl InvoiceStatusPort for InvoiceRepository {
    async fn mark_paid(&self, invoice_id: &str, paid_at: &str) -> Result<bool> {
        let invoice_id = invoice_id.to_string();
        let paid_at = paid_at.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let affected = diesel::update(invoices::table.find(&invoice_id))
                    .set((
                        invoices::status.eq(InvoiceStatus::Paid.as_str()),
                        invoices::paid_at.eq(Some(paid_at)),
                        invoices::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected > 0)
            })
            .await
    }

    fn find_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>> {
        let mut conn = get_connection(&self.pool)?;
        let row = invoices::table
            .find(invoice_id)
            .first::<InvoiceDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Invoice::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn mark_paid_flips_status_and_stamps_time() {
        let (pool, writer) = setup_db();
        let repo = InvoiceRepository::new(pool, writer);

        let invoice = repo
            .create_invoice("t1", dec!(1500), "EUR")
            .await
            .expect("create");
        assert_eq!(invoice.status, InvoiceStatus::Open);

        assert!(repo
            .mark_paid(&invoice.id, "2026-03-01T12:00:00+00:00")
            .await
            .expect("mark paid"));

        let found = repo
            .find_invoice(&invoice.id)
            .expect("find")
            .expect("invoice");
        assert_eq!(found.status, InvoiceStatus::Paid);
        assert!(found.paid_at.is_some());

        assert!(!repo
            .mark_paid("missing", "2026-03-01T12:00:00+00:00")
            .await
            .expect("missing invoice"));
    }
}
