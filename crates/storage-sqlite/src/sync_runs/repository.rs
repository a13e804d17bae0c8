use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use uuid::Uuid;

use ledgerdesk_core::sync::{
    SyncRun, SyncRunCounts, SyncRunRepositoryTrait, SyncRunStatus, SyncType,
};
use ledgerdesk_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_runs;

use super::model::SyncRunDB;

pub struct SyncRunRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SyncRunRepository {
    pub fn new(
        pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        SyncRunRepository { pool, writer }
    }
}

#[async_trait]
impl SyncRunRepositoryTrait for SyncRunRepository {
    async fn create_run(
        &self,
        tenant: &str,
        connection_id: &str,
        sync_type: SyncType,
    ) -> Result<SyncRun> {
        let tenant = tenant.to_string();
        let connection_id = connection_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SyncRun> {
                let row = SyncRunDB {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: tenant,
                    connection_id,
                    sync_type: sync_type.as_str().to_string(),
                    status: SyncRunStatus::Syncing.as_str().to_string(),
                    accounts_fetched: 0,
                    accounts_synced: 0,
                    transactions_fetched: 0,
                    transactions_synced: 0,
                    error_message: None,
                    started_at: Utc::now().to_rfc3339(),
                    completed_at: None,
                    duration_ms: None,
                };

                let inserted = diesel::insert_into(sync_runs::table)
                    .values(&row)
                    .returning(SyncRunDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                Ok(SyncRun::from(inserted))
            })
            .await
    }

    async fn finish_run(
        &self,
        run_id: &str,
        status: SyncRunStatus,
        counts: SyncRunCounts,
        error_message: Option<String>,
    ) -> Result<()> {
        let run_id = run_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let started_at: Option<String> = sync_runs::table
                    .find(&run_id)
                    .select(sync_runs::started_at)
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let now = Utc::now();
                let duration_ms = started_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|start| (now - start.with_timezone(&Utc)).num_milliseconds());

                // Runs are append-only once final: the filter ensures only a
                // `syncing` row can transition.
                diesel::update(
                    sync_runs::table
                        .find(&run_id)
                        .filter(sync_runs::status.eq(SyncRunStatus::Syncing.as_str())),
                )
                .set((
                    sync_runs::status.eq(status.as_str()),
                    sync_runs::accounts_fetched.eq(counts.accounts_fetched),
                    sync_runs::accounts_synced.eq(counts.accounts_synced),
                    sync_runs::transactions_fetched.eq(counts.transactions_fetched),
                    sync_runs::transactions_synced.eq(counts.transactions_synced),
                    sync_runs::error_message.eq(error_message),
                    sync_runs::completed_at.eq(Some(now.to_rfc3339())),
                    sync_runs::duration_ms.eq(duration_ms),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn list_runs(&self, tenant: &str, limit: i64) -> Result<Vec<SyncRun>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_runs::table
            .filter(sync_runs::tenant_id.eq(tenant))
            .order(sync_runs::started_at.desc())
            .limit(limit)
            .load::<SyncRunDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(SyncRun::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    #[tokio::test]
    async fn run_lifecycle_records_counts_and_duration() {
        let (pool, writer) = setup_db();
        let repo = SyncRunRepository::new(pool, writer);

        let run = repo
            .create_run("t1", "conn_1", SyncType::Manual)
            .await
            .expect("create");
        assert_eq!(run.status, SyncRunStatus::Syncing);

        repo.finish_run(
            &run.id,
            SyncRunStatus::Completed,
            SyncRunCounts {
                accounts_fetched: 2,
                accounts_synced: 2,
                transactions_fetched: 5,
                transactions_synced: 5,
            },
            None,
        )
        .await
        .expect("finish");

        let runs = repo.list_runs("t1", 10).expect("list");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, SyncRunStatus::Completed);
        assert_eq!(runs[0].accounts_synced, 2);
        assert_eq!(runs[0].transactions_synced, 5);
        assert!(runs[0].completed_at.is_some());
        assert!(runs[0].duration_ms.is_some());
    }

    #[tokio::test]
    async fn finished_runs_are_never_mutated_again() {
        let (pool, writer) = setup_db();
        let repo = SyncRunRepository::new(pool, writer);

        let run = repo
            .create_run("t1", "conn_1", SyncType::Scheduled)
            .await
            .expect("create");

        repo.finish_run(&run.id, SyncRunStatus::Failed, SyncRunCounts::default(), Some("timeout".to_string()))
            .await
            .expect("finish");

        // A second finalize attempt must not overwrite the failed record.
        repo.finish_run(
            &run.id,
            SyncRunStatus::Completed,
            SyncRunCounts {
                accounts_fetched: 9,
                accounts_synced: 9,
                transactions_fetched: 9,
                transactions_synced: 9,
            },
            None,
        )
        .await
        .expect("second finish");

        let runs = repo.list_runs("t1", 10).expect("list");
        assert_eq!(runs[0].status, SyncRunStatus::Failed);
        assert_eq!(runs[0].error_message.as_deref(), Some("timeout"));
        assert_eq!(runs[0].accounts_synced, 0);
    }
}
