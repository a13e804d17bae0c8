//! Database models for connections and pending authorizations.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerdesk_core::connections::{Connection, ConnectionStatus, OAuthStateBinding};
use ledgerdesk_core::sync::SyncRunStatus;

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
#[diesel(table_name = crate::schema::connections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ConnectionDB {
    pub id: String,
    pub tenant_id: String,
    pub status: String,
    pub access_token_enc: String,
    pub refresh_token_enc: String,
    pub token_type: String,
    pub access_expires_at: String,
    pub refresh_expires_at: String,
    pub last_sync_at: Option<String>,
    pub last_sync_status: Option<String>,
    pub last_sync_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ConnectionDB> for Connection {
    fn from(db: ConnectionDB) -> Self {
        Connection {
            id: db.id,
            tenant_id: db.tenant_id,
            status: ConnectionStatus::from_wire(&db.status).unwrap_or(ConnectionStatus::Revoked),
            access_token_enc: db.access_token_enc,
            refresh_token_enc: db.refresh_token_enc,
            token_type: db.token_type,
            access_expires_at: db.access_expires_at,
            refresh_expires_at: db.refresh_expires_at,
            last_sync_at: db.last_sync_at,
            last_sync_status: db
                .last_sync_status
                .as_deref()
                .and_then(SyncRunStatus::from_wire),
            last_sync_error: db.last_sync_error,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

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
#[diesel(primary_key(tenant_id))]
#[diesel(table_name = crate::schema::oauth_states)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OAuthStateDB {
    pub tenant_id: String,
    pub state: String,
    pub created_at: String,
    pub expires_at: String,
}

impl From<OAuthStateDB> for OAuthStateBinding {
    fn from(db: OAuthStateDB) -> Self {
        OAuthStateBinding {
            tenant_id: db.tenant_id,
            state: db.state,
            created_at: db.created_at,
            expires_at: db.expires_at,
        }
    }
}
