//! On-demand and scheduled reconciliation of accounts and transactions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::accounts::{AccountRepositoryTrait, AccountUpsert};
use crate::connections::{ConnectionRepositoryTrait, ConnectionService};
use crate::providers::BankingProvider;
use crate::transactions::{TransactionRepositoryTrait, TransactionUpsert};
use crate::{Error, Result};

use super::{SyncRunCounts, SyncRunRepositoryTrait, SyncRunStatus, SyncType};

/// Trailing window of transactions fetched per run.
const TRANSACTION_WINDOW_DAYS: i64 = 30;

/// Provider-side cap on transactions per run.
const TRANSACTION_FETCH_LIMIT: i64 = 500;

/// Summary returned to the caller of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub sync_run_id: String,
    pub accounts_synced: usize,
    pub transactions_synced: usize,
}

pub struct SyncService {
    connections: Arc<ConnectionService>,
    connection_repo: Arc<dyn ConnectionRepositoryTrait>,
    accounts: Arc<dyn AccountRepositoryTrait>,
    transactions: Arc<dyn TransactionRepositoryTrait>,
    sync_runs: Arc<dyn SyncRunRepositoryTrait>,
    provider: Arc<dyn BankingProvider>,
}

impl SyncService {
    pub fn new(
        connections: Arc<ConnectionService>,
        connection_repo: Arc<dyn ConnectionRepositoryTrait>,
        accounts: Arc<dyn AccountRepositoryTrait>,
        transactions: Arc<dyn TransactionRepositoryTrait>,
        sync_runs: Arc<dyn SyncRunRepositoryTrait>,
        provider: Arc<dyn BankingProvider>,
    ) -> Self {
        Self {
            connections,
            connection_repo,
            accounts,
            transactions,
            sync_runs,
            provider,
        }
    }

    /// Pull accounts and a trailing transaction window for the tenant and
    /// reconcile them into local storage.
    ///
    /// Upserts are keyed by external ids, so overlapping or repeated runs
    /// converge instead of duplicating rows.
    pub async fn run_sync(&self, tenant_id: &str, sync_type: SyncType) -> Result<SyncOutcome> {
        let token = self.connections.get_valid_token(tenant_id).await?;
        let connection = self
            .connection_repo
            .find_by_tenant(tenant_id)?
            .ok_or(Error::NoConnection)?;

        // The run row goes in before any provider call; a crash mid-sync is
        // then observable as a stuck `syncing` run.
        let run = self
            .sync_runs
            .create_run(tenant_id, &connection.id, sync_type)
            .await?;

        log::info!("[Sync] run {} started for tenant {}", run.id, tenant_id);

        let mut counts = SyncRunCounts::default();
        match self.execute(tenant_id, &token, &mut counts).await {
            Ok(()) => {
                self.sync_runs
                    .finish_run(&run.id, SyncRunStatus::Completed, counts, None)
                    .await?;
                self.connection_repo
                    .record_sync_result(tenant_id, SyncRunStatus::Completed, None)
                    .await?;

                log::info!(
                    "[Sync] run {} completed: {} accounts, {} transactions",
                    run.id,
                    counts.accounts_synced,
                    counts.transactions_synced
                );
                Ok(SyncOutcome {
                    sync_run_id: run.id,
                    accounts_synced: counts.accounts_synced as usize,
                    transactions_synced: counts.transactions_synced as usize,
                })
            }
            Err(err) => {
                let message = err.to_string();
                log::error!("[Sync] run {} failed: {}", run.id, message);

                // Bookkeeping is best-effort on the failure path; the
                // original error is what the caller needs to see.
                if let Err(finish_err) = self
                    .sync_runs
                    .finish_run(
                        &run.id,
                        SyncRunStatus::Failed,
                        counts,
                        Some(message.clone()),
                    )
                    .await
                {
                    log::error!("[Sync] failed to finalize run {}: {}", run.id, finish_err);
                }
                if let Err(record_err) = self
                    .connection_repo
                    .record_sync_result(tenant_id, SyncRunStatus::Failed, Some(message))
                    .await
                {
                    log::error!(
                        "[Sync] failed to record sync result for tenant {}: {}",
                        tenant_id,
                        record_err
                    );
                }
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        tenant_id: &str,
        token: &str,
        counts: &mut SyncRunCounts,
    ) -> Result<()> {
        let fetched_accounts = self.provider.list_accounts(token).await?;
        counts.accounts_fetched = fetched_accounts.len() as i32;

        for account in fetched_accounts {
            let external_id = account.external_id.clone();
            match self
                .accounts
                .upsert_account(AccountUpsert::from_provider(tenant_id, account))
                .await
            {
                Ok(_) => counts.accounts_synced += 1,
                Err(err) => {
                    // Partial account failures stay visible through the
                    // fetched/synced gap without aborting the run.
                    log::error!(
                        "[Sync] failed to upsert account {}: {}",
                        external_id,
                        err
                    );
                }
            }
        }

        // Resolution map from the now-current local rows, not the fetched
        // page, so accounts mirrored by earlier runs still resolve.
        let account_ids: HashMap<String, String> = self
            .accounts
            .list_accounts_for_tenant(tenant_id)?
            .into_iter()
            .map(|account| (account.external_id, account.id))
            .collect();

        let to = Utc::now();
        let from = to - chrono::Duration::days(TRANSACTION_WINDOW_DAYS);
        let fetched_transactions = self
            .provider
            .list_transactions(
                token,
                &from.to_rfc3339(),
                &to.to_rfc3339(),
                TRANSACTION_FETCH_LIMIT,
            )
            .await?;
        counts.transactions_fetched = fetched_transactions.len() as i32;

        for transaction in fetched_transactions {
            let Some(account_id) = account_ids.get(&transaction.account_external_id) else {
                // Expected transient skew: the owning account is not
                // mirrored yet. It will resolve on a later run.
                log::debug!(
                    "[Sync] skipping transaction {}: unknown account {}",
                    transaction.external_id,
                    transaction.account_external_id
                );
                continue;
            };

            self.transactions
                .upsert_transaction(TransactionUpsert::from_provider(
                    tenant_id,
                    account_id,
                    transaction,
                ))
                .await?;
            counts.transactions_synced += 1;
        }

        Ok(())
    }
}
