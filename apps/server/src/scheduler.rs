//! Background sync scheduler.
//!
//! Periodically runs the sync engine for every tenant with an active
//! connection. Overlap with a manual sync is tolerated; upserts converge.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use ledgerdesk_core::sync::SyncType;

use crate::main_lib::AppState;

pub fn spawn(state: Arc<AppState>) {
    let interval_secs = state.config.sync_interval_secs;
    if interval_secs == 0 {
        info!("[Scheduler] periodic sync disabled");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let connections = match state.connection_repo.list_active() {
                Ok(connections) => connections,
                Err(err) => {
                    error!("[Scheduler] failed to list connections: {}", err);
                    continue;
                }
            };

            for connection in connections {
                match state
                    .sync_service
                    .run_sync(&connection.tenant_id, SyncType::Scheduled)
                    .await
                {
                    Ok(outcome) => info!(
                        "[Scheduler] synced tenant {}: {} accounts, {} transactions",
                        connection.tenant_id,
                        outcome.accounts_synced,
                        outcome.transactions_synced
                    ),
                    Err(err) => error!(
                        "[Scheduler] sync failed for tenant {}: {}",
                        connection.tenant_id, err
                    ),
                }
            }
        }
    });
}
