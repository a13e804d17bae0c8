//! Sync engine scenarios against a stubbed provider and a real database.

mod common;

use common::*;

use ledgerdesk_core::sync::{SyncRunRepositoryTrait, SyncRunStatus, SyncType};
use ledgerdesk_core::transactions::TransactionRepositoryTrait;
use ledgerdesk_core::Error;

#[tokio::test]
async fn happy_path_sync_mirrors_accounts_and_transactions() {
    let ctx = setup();
    connect_tenant(&ctx, "t1").await;

    ctx.provider.set_accounts(vec![
        provider_account("acc_1", "Current account"),
        provider_account("acc_2", "Savings account"),
    ]);
    ctx.provider.set_transactions(vec![
        provider_transaction("tx_1", "acc_1"),
        provider_transaction("tx_2", "acc_1"),
        provider_transaction("tx_3", "acc_1"),
        provider_transaction("tx_4", "acc_2"),
        provider_transaction("tx_5", "acc_2"),
    ]);

    let outcome = ctx
        .state
        .sync_service
        .run_sync("t1", SyncType::Manual)
        .await
        .expect("sync");

    assert_eq!(outcome.accounts_synced, 2);
    assert_eq!(outcome.transactions_synced, 5);

    // Every transaction links to the mirrored account that owns it.
    let accounts = ctx.accounts();
    let mirrored = ledgerdesk_core::accounts::AccountRepositoryTrait::list_accounts_for_tenant(
        &accounts, "t1",
    )
    .expect("accounts");
    assert_eq!(mirrored.len(), 2);

    let transactions = ctx.transactions().list_for_tenant("t1").expect("transactions");
    assert_eq!(transactions.len(), 5);
    for transaction in &transactions {
        assert!(mirrored.iter().any(|a| a.id == transaction.account_id));
    }

    let runs = ctx.sync_runs().list_runs("t1", 10).expect("runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, SyncRunStatus::Completed);
    assert_eq!(runs[0].accounts_fetched, 2);
    assert_eq!(runs[0].transactions_fetched, 5);
}

#[tokio::test]
async fn orphan_transaction_is_skipped_not_fatal() {
    let ctx = setup();
    connect_tenant(&ctx, "t1").await;

    ctx.provider
        .set_accounts(vec![provider_account("acc_1", "Current account")]);
    ctx.provider
        .set_transactions(vec![provider_transaction("tx_1", "acc_unknown")]);

    let outcome = ctx
        .state
        .sync_service
        .run_sync("t1", SyncType::Manual)
        .await
        .expect("sync");

    assert_eq!(outcome.accounts_synced, 1);
    assert_eq!(outcome.transactions_synced, 0);

    let runs = ctx.sync_runs().list_runs("t1", 10).expect("runs");
    assert_eq!(runs[0].status, SyncRunStatus::Completed);
    assert!(runs[0].error_message.is_none());
}

#[tokio::test]
async fn repeated_sync_converges_without_duplicates() {
    let ctx = setup();
    connect_tenant(&ctx, "t1").await;

    ctx.provider
        .set_accounts(vec![provider_account("acc_1", "Current account")]);
    ctx.provider
        .set_transactions(vec![provider_transaction("tx_1", "acc_1")]);

    let first = ctx
        .state
        .sync_service
        .run_sync("t1", SyncType::Manual)
        .await
        .expect("first sync");
    let second = ctx
        .state
        .sync_service
        .run_sync("t1", SyncType::Scheduled)
        .await
        .expect("second sync");

    assert_eq!(first.accounts_synced, second.accounts_synced);
    assert_eq!(first.transactions_synced, second.transactions_synced);

    let accounts = ctx.accounts();
    assert_eq!(
        ledgerdesk_core::accounts::AccountRepositoryTrait::list_accounts_for_tenant(
            &accounts, "t1"
        )
        .expect("accounts")
        .len(),
        1
    );
    assert_eq!(ctx.transactions().list_for_tenant("t1").expect("txs").len(), 1);
    assert_eq!(ctx.sync_runs().list_runs("t1", 10).expect("runs").len(), 2);
}

#[tokio::test]
async fn sync_without_connection_fails_fast() {
    let ctx = setup();

    let result = ctx.state.sync_service.run_sync("t9", SyncType::Manual).await;
    assert!(matches!(result, Err(Error::NoConnection)));

    // Fast failure happens before any run row is created.
    assert!(ctx.sync_runs().list_runs("t9", 10).expect("runs").is_empty());
}

#[tokio::test]
async fn provider_failure_is_recorded_on_the_run_and_connection() {
    let ctx = setup();
    connect_tenant(&ctx, "t1").await;

    *ctx.provider.fail_accounts.lock().unwrap() = true;

    let result = ctx.state.sync_service.run_sync("t1", SyncType::Manual).await;
    assert!(result.is_err());

    let runs = ctx.sync_runs().list_runs("t1", 10).expect("runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, SyncRunStatus::Failed);
    assert!(runs[0]
        .error_message
        .as_deref()
        .expect("error message")
        .contains("timed out"));

    let connection = ctx
        .state
        .connection_repo
        .find_by_tenant("t1")
        .expect("find")
        .expect("connection");
    assert_eq!(connection.last_sync_status, Some(SyncRunStatus::Failed));
    assert!(connection.last_sync_error.is_some());
}
