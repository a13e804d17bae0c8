use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use uuid::Uuid;

use ledgerdesk_core::transactions::{
    BankTransaction, StateApplyOutcome, TransactionRepositoryTrait, TransactionState,
    TransactionUpsert,
};
use ledgerdesk_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::bank_transactions;

use super::model::BankTransactionDB;

pub struct TransactionRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(
        pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        TransactionRepository { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn upsert_transaction(&self, upsert: TransactionUpsert) -> Result<BankTransaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BankTransaction> {
                let now = Utc::now().to_rfc3339();
                let existing = bank_transactions::table
                    .filter(bank_transactions::tenant_id.eq(&upsert.tenant_id))
                    .filter(bank_transactions::external_id.eq(&upsert.external_id))
                    .first::<BankTransactionDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let result = match existing {
                    None => {
                        let row = BankTransactionDB {
                            id: Uuid::new_v4().to_string(),
                            tenant_id: upsert.tenant_id,
                            external_id: upsert.external_id,
                            account_id: upsert.account_id,
                            amount: upsert.amount.to_string(),
                            currency: upsert.currency,
                            state: upsert.state.as_str().to_string(),
                            description: upsert.description,
                            counterparty: upsert.counterparty,
                            booked_at: upsert.booked_at,
                            created_at: now.clone(),
                            updated_at: now,
                        };
                        diesel::insert_into(bank_transactions::table)
                            .values(&row)
                            .returning(BankTransactionDB::as_returning())
                            .get_result(conn)
                            .map_err(StorageError::from)?
                    }
                    Some(row) => {
                        // A terminal mirror state is kept when the incoming
                        // payload reports a non-terminal one.
                        let current = TransactionState::from_wire(&row.state)
                            .unwrap_or(TransactionState::Pending);
                        let next = if current.is_terminal() && !upsert.state.is_terminal() {
                            current
                        } else {
                            upsert.state
                        };

                        diesel::update(bank_transactions::table.find(row.id.clone()))
                            .set((
                                bank_transactions::account_id.eq(upsert.account_id.clone()),
                                bank_transactions::amount.eq(upsert.amount.to_string()),
                                bank_transactions::currency.eq(upsert.currency.clone()),
                                bank_transactions::state.eq(next.as_str()),
                                bank_transactions::description.eq(upsert.description.clone()),
                                bank_transactions::counterparty.eq(upsert.counterparty.clone()),
                                bank_transactions::booked_at.eq(upsert.booked_at.clone()),
                                bank_transactions::updated_at.eq(now.clone()),
                            ))
                            .returning(BankTransactionDB::as_returning())
                            .get_result(conn)
                            .map_err(StorageError::from)?
                    }
                };

                Ok(BankTransaction::from(result))
            })
            .await
    }

    fn find_by_external_id(&self, external: &str) -> Result<Option<BankTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let row = bank_transactions::table
            .filter(bank_transactions::external_id.eq(external))
            .first::<BankTransactionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(BankTransaction::from))
    }

    fn list_for_tenant(&self, tenant: &str) -> Result<Vec<BankTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = bank_transactions::table
            .filter(bank_transactions::tenant_id.eq(tenant))
            .order(bank_transactions::booked_at.desc())
            .load::<BankTransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(BankTransaction::from).collect())
    }

    async fn apply_state_by_external_id(
        &self,
        external: &str,
        state: TransactionState,
    ) -> Result<StateApplyOutcome> {
        let external = external.to_string();
        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<StateApplyOutcome> {
                    let row = bank_transactions::table
                        .filter(bank_transactions::external_id.eq(&external))
                        .first::<BankTransactionDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    let Some(row) = row else {
                        return Ok(StateApplyOutcome::Missing);
                    };

                    let current = TransactionState::from_wire(&row.state)
                        .unwrap_or(TransactionState::Pending);
                    if current.is_terminal() && !state.is_terminal() {
                        return Ok(StateApplyOutcome::SkippedTerminal);
                    }

                    diesel::update(bank_transactions::table.find(&row.id))
                        .set((
                            bank_transactions::state.eq(state.as_str()),
                            bank_transactions::updated_at.eq(Utc::now().to_rfc3339()),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;

                    Ok(StateApplyOutcome::Applied)
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_account, setup_db};
    use rust_decimal_macros::dec;

    fn upsert_for(tenant: &str, external_id: &str, account_id: &str) -> TransactionUpsert {
        TransactionUpsert {
            tenant_id: tenant.to_string(),
            external_id: external_id.to_string(),
            account_id: account_id.to_string(),
            amount: dec!(-42.50),
            currency: "EUR".to_string(),
            state: TransactionState::Pending,
            description: Some("Office supplies".to_string()),
            counterparty: Some("Staples BV".to_string()),
            booked_at: Some("2026-02-01T09:30:00+00:00".to_string()),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_the_natural_key() {
        let (pool, writer) = setup_db();
        let account_id = seed_account(&pool, "t1", "acc_1");
        let repo = TransactionRepository::new(pool, writer);

        let first = repo
            .upsert_transaction(upsert_for("t1", "tx_1", &account_id))
            .await
            .expect("first");
        let second = repo
            .upsert_transaction(upsert_for("t1", "tx_1", &account_id))
            .await
            .expect("second");

        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_for_tenant("t1").expect("list").len(), 1);
    }

    #[tokio::test]
    async fn booked_state_survives_a_pending_resync() {
        let (pool, writer) = setup_db();
        let account_id = seed_account(&pool, "t1", "acc_1");
        let repo = TransactionRepository::new(pool, writer);

        repo.upsert_transaction(upsert_for("t1", "tx_1", &account_id))
            .await
            .expect("insert");
        repo.apply_state_by_external_id("tx_1", TransactionState::Booked)
            .await
            .expect("book");

        let resynced = repo
            .upsert_transaction(upsert_for("t1", "tx_1", &account_id))
            .await
            .expect("resync");
        assert_eq!(resynced.state, TransactionState::Booked);
    }

    #[tokio::test]
    async fn state_apply_reports_missing_and_terminal_skips() {
        let (pool, writer) = setup_db();
        let account_id = seed_account(&pool, "t1", "acc_1");
        let repo = TransactionRepository::new(pool, writer);

        assert_eq!(
            repo.apply_state_by_external_id("tx_unknown", TransactionState::Booked)
                .await
                .expect("missing"),
            StateApplyOutcome::Missing
        );

        repo.upsert_transaction(upsert_for("t1", "tx_1", &account_id))
            .await
            .expect("insert");
        repo.apply_state_by_external_id("tx_1", TransactionState::Cancelled)
            .await
            .expect("cancel");

        assert_eq!(
            repo.apply_state_by_external_id("tx_1", TransactionState::Pending)
                .await
                .expect("regress"),
            StateApplyOutcome::SkippedTerminal
        );
    }
}
