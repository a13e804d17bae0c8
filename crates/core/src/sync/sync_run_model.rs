//! Sync run audit records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// What triggered a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Manual,
    Scheduled,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Manual => "manual",
            SyncType::Scheduled => "scheduled",
        }
    }
}

/// Run lifecycle. A crash mid-sync leaves an observable stuck `Syncing` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Syncing,
    Completed,
    Failed,
}

impl SyncRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Syncing => "syncing",
            SyncRunStatus::Completed => "completed",
            SyncRunStatus::Failed => "failed",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "syncing" => Some(SyncRunStatus::Syncing),
            "completed" => Some(SyncRunStatus::Completed),
            "failed" => Some(SyncRunStatus::Failed),
            _ => None,
        }
    }
}

/// One audited execution of the sync engine. Append-only; rows are never
/// mutated once they reach `completed` or `failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: String,
    pub tenant_id: String,
    pub connection_id: String,
    pub sync_type: SyncType,
    pub status: SyncRunStatus,
    pub accounts_fetched: i32,
    pub accounts_synced: i32,
    pub transactions_fetched: i32,
    pub transactions_synced: i32,
    pub error_message: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_ms: Option<i64>,
}

/// Record counters accumulated while a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRunCounts {
    pub accounts_fetched: i32,
    pub accounts_synced: i32,
    pub transactions_fetched: i32,
    pub transactions_synced: i32,
}

#[async_trait]
pub trait SyncRunRepositoryTrait: Send + Sync {
    /// Create a run in `syncing` status before any external call.
    async fn create_run(
        &self,
        tenant_id: &str,
        connection_id: &str,
        sync_type: SyncType,
    ) -> Result<SyncRun>;

    /// Finalize a run. Only a `syncing` row may transition; completed and
    /// failed rows stay untouched.
    async fn finish_run(
        &self,
        run_id: &str,
        status: SyncRunStatus,
        counts: SyncRunCounts,
        error_message: Option<String>,
    ) -> Result<()>;

    fn list_runs(&self, tenant_id: &str, limit: i64) -> Result<Vec<SyncRun>>;
}
