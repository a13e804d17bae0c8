use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::Connection as _;
use diesel::SqliteConnection;
use r2d2::Pool;
use uuid::Uuid;

use ledgerdesk_core::connections::{
    Connection, ConnectionRepositoryTrait, ConnectionStatus, NewConnection, OAuthStateBinding,
    TokenUpdate,
};
use ledgerdesk_core::sync::SyncRunStatus;
use ledgerdesk_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{
    audit_events, bank_accounts, bank_transactions, connections, oauth_states, payments, sync_runs,
};

use super::model::{ConnectionDB, OAuthStateDB};

pub struct ConnectionRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ConnectionRepository {
    pub fn new(
        pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ConnectionRepository { pool, writer }
    }
}

#[async_trait]
impl ConnectionRepositoryTrait for ConnectionRepository {
    fn find_by_tenant(&self, tenant: &str) -> Result<Option<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        let row = connections::table
            .filter(connections::tenant_id.eq(tenant))
            .first::<ConnectionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Connection::from))
    }

    fn list_active(&self) -> Result<Vec<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = connections::table
            .filter(connections::status.eq(ConnectionStatus::Active.as_str()))
            .load::<ConnectionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Connection::from).collect())
    }

    async fn replace_for_tenant(&self, new: NewConnection) -> Result<Connection> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Connection> {
                let now = Utc::now().to_rfc3339();
                let row = ConnectionDB {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: new.tenant_id.clone(),
                    status: ConnectionStatus::Active.as_str().to_string(),
                    access_token_enc: new.access_token_enc,
                    refresh_token_enc: new.refresh_token_enc,
                    token_type: new.token_type,
                    access_expires_at: new.access_expires_at,
                    refresh_expires_at: new.refresh_expires_at,
                    last_sync_at: None,
                    last_sync_status: None,
                    last_sync_error: None,
                    created_at: now.clone(),
                    updated_at: now,
                };

                // One connection per tenant: drop any prior row first so
                // stale credentials cannot linger next to the new ones.
                diesel::delete(
                    connections::table.filter(connections::tenant_id.eq(&new.tenant_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                let inserted = diesel::insert_into(connections::table)
                    .values(&row)
                    .returning(ConnectionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(Connection::from(inserted))
            })
            .await
    }

    async fn store_tokens(&self, tenant: &str, update: TokenUpdate) -> Result<()> {
        let tenant = tenant.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(
                    connections::table.filter(connections::tenant_id.eq(&tenant)),
                )
                .set((
                    connections::access_token_enc.eq(&update.access_token_enc),
                    connections::refresh_token_enc.eq(&update.refresh_token_enc),
                    connections::token_type.eq(&update.token_type),
                    connections::access_expires_at.eq(&update.access_expires_at),
                    connections::refresh_expires_at.eq(&update.refresh_expires_at),
                    connections::updated_at.eq(Utc::now().to_rfc3339()),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn revoke(&self, tenant: &str) -> Result<bool> {
        let tenant = tenant.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let affected = diesel::update(
                    connections::table.filter(connections::tenant_id.eq(&tenant)),
                )
                .set((
                    connections::status.eq(ConnectionStatus::Revoked.as_str()),
                    connections::access_token_enc.eq(""),
                    connections::refresh_token_enc.eq(""),
                    connections::updated_at.eq(Utc::now().to_rfc3339()),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(affected > 0)
            })
            .await
    }

    async fn purge(&self, tenant: &str) -> Result<bool> {
        let tenant = tenant.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let affected = conn.transaction::<usize, StorageError, _>(|conn| {
                        diesel::delete(
                            bank_transactions::table
                                .filter(bank_transactions::tenant_id.eq(&tenant)),
                        )
                        .execute(conn)?;
                        diesel::delete(
                            bank_accounts::table.filter(bank_accounts::tenant_id.eq(&tenant)),
                        )
                        .execute(conn)?;
                        diesel::delete(payments::table.filter(payments::tenant_id.eq(&tenant)))
                            .execute(conn)?;
                        diesel::delete(sync_runs::table.filter(sync_runs::tenant_id.eq(&tenant)))
                            .execute(conn)?;
                        diesel::delete(
                            audit_events::table.filter(audit_events::tenant_id.eq(&tenant)),
                        )
                        .execute(conn)?;
                        diesel::delete(
                            oauth_states::table.filter(oauth_states::tenant_id.eq(&tenant)),
                        )
                        .execute(conn)?;
                        let affected = diesel::delete(
                            connections::table.filter(connections::tenant_id.eq(&tenant)),
                        )
                        .execute(conn)?;
                        Ok(affected)
                    })?;
                Ok(affected > 0)
            })
            .await
    }

    async fn record_sync_result(
        &self,
        tenant: &str,
        status: SyncRunStatus,
        error: Option<String>,
    ) -> Result<()> {
        let tenant = tenant.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let now = Utc::now().to_rfc3339();
                diesel::update(
                    connections::table.filter(connections::tenant_id.eq(&tenant)),
                )
                .set((
                    connections::last_sync_at.eq(Some(now.clone())),
                    connections::last_sync_status.eq(Some(status.as_str().to_string())),
                    connections::last_sync_error.eq(error),
                    connections::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn put_state_binding(&self, binding: OAuthStateBinding) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let row = OAuthStateDB {
                    tenant_id: binding.tenant_id,
                    state: binding.state,
                    created_at: binding.created_at,
                    expires_at: binding.expires_at,
                };

                diesel::insert_into(oauth_states::table)
                    .values(&row)
                    .on_conflict(oauth_states::tenant_id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn consume_state_binding(&self, tenant: &str) -> Result<Option<OAuthStateBinding>> {
        let tenant = tenant.to_string();
        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<Option<OAuthStateBinding>> {
                    // Select-then-delete runs on the single writer thread,
                    // so the binding can only be consumed once.
                    let row = oauth_states::table
                        .find(&tenant)
                        .first::<OAuthStateDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    if row.is_some() {
                        diesel::delete(oauth_states::table.find(&tenant))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }

                    Ok(row.map(OAuthStateBinding::from))
                },
            )
            .await
    }
}
