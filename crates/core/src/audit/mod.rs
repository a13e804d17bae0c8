//! Append-only audit trail for externally triggered state changes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: String,
    pub tenant_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub detail: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub tenant_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub detail: serde_json::Value,
}

impl NewAuditEvent {
    pub fn new(
        tenant_id: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            detail,
        }
    }
}

/// Write-only from this subsystem's perspective; rows are never updated
/// or deleted.
#[async_trait]
pub trait AuditLogPort: Send + Sync {
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent>;

    fn list_for_tenant(&self, tenant_id: &str, limit: i64) -> Result<Vec<AuditEvent>>;
}
