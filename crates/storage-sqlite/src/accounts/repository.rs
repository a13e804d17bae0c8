use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use uuid::Uuid;

use ledgerdesk_core::accounts::{AccountRepositoryTrait, AccountUpsert, BankAccount};
use ledgerdesk_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::bank_accounts;

use super::model::BankAccountDB;

pub struct AccountRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(
        pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        AccountRepository { pool, writer }
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn upsert_account(&self, upsert: AccountUpsert) -> Result<BankAccount> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BankAccount> {
                let now = Utc::now().to_rfc3339();
                let row = BankAccountDB {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: upsert.tenant_id,
                    external_id: upsert.external_id,
                    name: upsert.name,
                    iban: upsert.iban,
                    balance: upsert.balance.to_string(),
                    currency: upsert.currency,
                    account_kind: upsert.account_kind,
                    balance_refreshed_at: Some(now.clone()),
                    created_at: now.clone(),
                    updated_at: now.clone(),
                };

                // Conflict on the natural key keeps the existing local id so
                // transaction foreign keys stay stable across runs.
                let result = diesel::insert_into(bank_accounts::table)
                    .values(&row)
                    .on_conflict((bank_accounts::tenant_id, bank_accounts::external_id))
                    .do_update()
                    .set((
                        bank_accounts::name.eq(row.name.clone()),
                        bank_accounts::iban.eq(row.iban.clone()),
                        bank_accounts::balance.eq(row.balance.clone()),
                        bank_accounts::currency.eq(row.currency.clone()),
                        bank_accounts::account_kind.eq(row.account_kind.clone()),
                        bank_accounts::balance_refreshed_at.eq(row.balance_refreshed_at.clone()),
                        bank_accounts::updated_at.eq(now.clone()),
                    ))
                    .returning(BankAccountDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(BankAccount::from(result))
            })
            .await
    }

    fn list_accounts_for_tenant(&self, tenant: &str) -> Result<Vec<BankAccount>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = bank_accounts::table
            .filter(bank_accounts::tenant_id.eq(tenant))
            .order(bank_accounts::name.asc())
            .load::<BankAccountDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(BankAccount::from).collect())
    }
}
