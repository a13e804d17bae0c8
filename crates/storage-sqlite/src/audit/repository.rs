use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use uuid::Uuid;

use ledgerdesk_core::audit::{AuditEvent, AuditLogPort, NewAuditEvent};
use ledgerdesk_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::audit_events;

use super::model::AuditEventDB;

pub struct AuditRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AuditRepository {
    pub fn new(
        pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        AuditRepository { pool, writer }
    }
}

#[async_trait]
impl AuditLogPort for AuditRepository {
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent> {
        let detail = serde_json::to_string(&event.detail)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<AuditEvent> {
                let row = AuditEventDB {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: event.tenant_id,
                    action: event.action,
                    entity_type: event.entity_type,
                    entity_id: event.entity_id,
                    detail,
                    created_at: Utc::now().to_rfc3339(),
                };

                let inserted = diesel::insert_into(audit_events::table)
                    .values(&row)
                    .returning(AuditEventDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(AuditEvent::from(inserted))
            })
            .await
    }

    fn list_for_tenant(&self, tenant: &str, limit: i64) -> Result<Vec<AuditEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = audit_events::table
            .filter(audit_events::tenant_id.eq(tenant))
            .order(audit_events::created_at.desc())
            .limit(limit)
            .load::<AuditEventDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(AuditEvent::from).collect())
    }
}
