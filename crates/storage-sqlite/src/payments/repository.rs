use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use uuid::Uuid;

use ledgerdesk_core::payments::{NewPayment, Payment, PaymentRepositoryTrait, PaymentStatus};
use ledgerdesk_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::payments;

use super::model::PaymentDB;

pub struct PaymentRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PaymentRepository {
    pub fn new(
        pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        PaymentRepository { pool, writer }
    }
}

#[async_trait]
impl PaymentRepositoryTrait for PaymentRepository {
    async fn insert_payment(&self, new: NewPayment) -> Result<Payment> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Payment> {
                let now = Utc::now().to_rfc3339();
                let row = PaymentDB {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: new.tenant_id,
                    request_id: new.request_id,
                    external_id: None,
                    invoice_id: new.invoice_id,
                    amount: new.amount.to_string(),
                    currency: new.currency,
                    counterparty_name: new.counterparty_name,
                    counterparty_iban: new.counterparty_iban,
                    description: new.description,
                    status: PaymentStatus::Pending.as_str().to_string(),
                    reason_code: None,
                    completed_at: None,
                    created_at: now.clone(),
                    updated_at: now,
                };

                let inserted = diesel::insert_into(payments::table)
                    .values(&row)
                    .returning(PaymentDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(Payment::from(inserted))
            })
            .await
    }

    async fn assign_external_id(
        &self,
        payment_id: &str,
        external_id: &str,
        status: PaymentStatus,
    ) -> Result<()> {
        let payment_id = payment_id.to_string();
        let external_id = external_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(payments::table.find(&payment_id))
                    .set((
                        payments::external_id.eq(Some(external_id)),
                        payments::status.eq(status.as_str()),
                        payments::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn find_by_external_id(&self, external: &str) -> Result<Option<Payment>> {
        let mut conn = get_connection(&self.pool)?;
        let row = payments::table
            .filter(payments::external_id.eq(external))
            .first::<PaymentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Payment::from))
    }

    fn find_by_request_id(&self, request: &str) -> Result<Option<Payment>> {
        let mut conn = get_connection(&self.pool)?;
        let row = payments::table
            .filter(payments::request_id.eq(request))
            .first::<PaymentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Payment::from))
    }

    fn list_for_tenant(&self, tenant: &str) -> Result<Vec<Payment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = payments::table
            .filter(payments::tenant_id.eq(tenant))
            .order(payments::created_at.desc())
            .load::<PaymentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn update_status(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        reason_code: Option<String>,
        completed_at: Option<String>,
    ) -> Result<()> {
        let payment_id = payment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(payments::table.find(&payment_id))
                    .set((
                        payments::status.eq(status.as_str()),
                        payments::reason_code.eq(reason_code),
                        payments::completed_at.eq(completed_at),
                        payments::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;
    use ledgerdesk_core::payments::{resolve_payment, PaymentLookup};
    use rust_decimal_macros::dec;

    fn new_payment(tenant: &str, request_id: &str) -> NewPayment {
        NewPayment {
            tenant_id: tenant.to_string(),
            request_id: request_id.to_string(),
            invoice_id: Some("inv_1".to_string()),
            amount: dec!(99.95),
            currency: "EUR".to_string(),
            counterparty_name: "Acme GmbH".to_string(),
            counterparty_iban: "DE89370400440532013000".to_string(),
            description: Some("Invoice inv_1".to_string()),
        }
    }

    #[tokio::test]
    async fn payment_resolves_by_either_identifier() {
        let (pool, writer) = setup_db();
        let repo = PaymentRepository::new(pool, writer);

        let payment = repo
            .insert_payment(new_payment("t1", "req_R1"))
            .await
            .expect("insert");

        // Before the provider assigns an id, only the request id resolves.
        match resolve_payment(&repo, "req_R1").expect("resolve") {
            PaymentLookup::FoundByRequestId(found) => assert_eq!(found.id, payment.id),
            other => panic!("unexpected lookup result: {:?}", other),
        }

        repo.assign_external_id(&payment.id, "pay_P1", PaymentStatus::Processing)
            .await
            .expect("assign");

        match resolve_payment(&repo, "pay_P1").expect("resolve") {
            PaymentLookup::FoundByExternalId(found) => {
                assert_eq!(found.id, payment.id);
                assert_eq!(found.status, PaymentStatus::Processing);
            }
            other => panic!("unexpected lookup result: {:?}", other),
        }

        // The request id keeps working after the external id exists.
        match resolve_payment(&repo, "req_R1").expect("resolve") {
            PaymentLookup::FoundByRequestId(found) => assert_eq!(found.id, payment.id),
            other => panic!("unexpected lookup result: {:?}", other),
        }

        assert!(matches!(
            resolve_payment(&repo, "nothing").expect("resolve"),
            PaymentLookup::NotFound
        ));
    }

    #[tokio::test]
    async fn status_update_records_reason_and_completion() {
        let (pool, writer) = setup_db();
        let repo = PaymentRepository::new(pool, writer);

        let payment = repo
            .insert_payment(new_payment("t1", "req_R2"))
            .await
            .expect("insert");

        repo.update_status(
            &payment.id,
            PaymentStatus::Completed,
            None,
            Some("2026-03-01T12:00:00+00:00".to_string()),
        )
        .await
        .expect("update");

        let found = repo
            .find_by_request_id("req_R2")
            .expect("find")
            .expect("payment");
        assert_eq!(found.status, PaymentStatus::Completed);
        assert_eq!(
            found.completed_at.as_deref(),
            Some("2026-03-01T12:00:00+00:00")
        );
    }
}
