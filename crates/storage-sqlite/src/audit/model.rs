//! Database model for audit events.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerdesk_core::audit::AuditEvent;

#[derive(
    Queryable, Identifiable, Insertable, Selectable, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::audit_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditEventDB {
    pub id: String,
    pub tenant_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub detail: String,
    pub created_at: String,
}

impl From<AuditEventDB> for AuditEvent {
    fn from(db: AuditEventDB) -> Self {
        AuditEvent {
            id: db.id,
            tenant_id: db.tenant_id,
            action: db.action,
            entity_type: db.entity_type,
            entity_id: db.entity_id,
            detail: serde_json::from_str(&db.detail).unwrap_or(serde_json::Value::Null),
            created_at: db.created_at,
        }
    }
}
