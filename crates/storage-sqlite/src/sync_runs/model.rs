//! Database model for sync run records.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerdesk_core::sync::{SyncRun, SyncRunStatus, SyncType};

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
#[diesel(table_name = crate::schema::sync_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncRunDB {
    pub id: String,
    pub tenant_id: String,
    pub connection_id: String,
    pub sync_type: String,
    pub status: String,
    pub accounts_fetched: i32,
    pub accounts_synced: i32,
    pub transactions_fetched: i32,
    pub transactions_synced: i32,
    pub error_message: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_ms: Option<i64>,
}

impl From<SyncRunDB> for SyncRun {
    fn from(db: SyncRunDB) -> Self {
        SyncRun {
            id: db.id,
            tenant_id: db.tenant_id,
            connection_id: db.connection_id,
            sync_type: match db.sync_type.as_str() {
                "scheduled" => SyncType::Scheduled,
                _ => SyncType::Manual,
            },
            status: SyncRunStatus::from_wire(&db.status).unwrap_or(SyncRunStatus::Failed),
            accounts_fetched: db.accounts_fetched,
            accounts_synced: db.accounts_synced,
            transactions_fetched: db.transactions_fetched,
            transactions_synced: db.transactions_synced,
            error_message: db.error_message,
            started_at: db.started_at,
            completed_at: db.completed_at,
            duration_ms: db.duration_ms,
        }
    }
}
