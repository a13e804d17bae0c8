//! Application state wiring and server entry point.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::info;

use ledgerdesk_banking::BankingApiClient;
use ledgerdesk_core::connections::{
    ConnectionRepositoryTrait, ConnectionService, IntegrationSettings,
};
use ledgerdesk_core::payments::PaymentService;
use ledgerdesk_core::providers::BankingProvider;
use ledgerdesk_core::sync::SyncService;
use ledgerdesk_core::vault::TokenVault;
use ledgerdesk_core::webhooks::WebhookService;
use ledgerdesk_storage_sqlite::accounts::AccountRepository;
use ledgerdesk_storage_sqlite::audit::AuditRepository;
use ledgerdesk_storage_sqlite::connections::ConnectionRepository;
use ledgerdesk_storage_sqlite::invoices::InvoiceRepository;
use ledgerdesk_storage_sqlite::payments::PaymentRepository;
use ledgerdesk_storage_sqlite::sync_runs::SyncRunRepository;
use ledgerdesk_storage_sqlite::{create_pool, run_migrations, spawn_writer};

use crate::api;
use crate::config::Config;
use crate::scheduler;

pub struct AppState {
    pub config: Config,
    pub connection_repo: Arc<dyn ConnectionRepositoryTrait>,
    pub connection_service: Arc<ConnectionService>,
    pub sync_service: Arc<SyncService>,
    pub payment_service: Arc<PaymentService>,
    pub webhook_service: Arc<WebhookService>,
}

/// Build the full application state over a migrated database.
///
/// The provider client is injectable so tests can stub the banking platform
/// without touching the network.
pub fn build_state(
    config: Config,
    provider: Option<Arc<dyn BankingProvider>>,
) -> anyhow::Result<Arc<AppState>> {
    let vault_key = config
        .vault_key
        .clone()
        .context("BANKING_VAULT_KEY is required")?;
    let vault = Arc::new(TokenVault::new(&vault_key).context("invalid BANKING_VAULT_KEY")?);

    let pool = create_pool(&config.db_path)
        .map_err(|e| anyhow::anyhow!("failed to open database {}: {}", config.db_path, e))?;
    run_migrations(&pool).map_err(|e| anyhow::anyhow!("failed to run migrations: {}", e))?;
    let writer = spawn_writer(pool.as_ref().clone());

    let connection_repo = Arc::new(ConnectionRepository::new(pool.clone(), writer.clone()));
    let account_repo = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let transaction_repo = Arc::new(
        ledgerdesk_storage_sqlite::transactions::TransactionRepository::new(
            pool.clone(),
            writer.clone(),
        ),
    );
    let payment_repo = Arc::new(PaymentRepository::new(pool.clone(), writer.clone()));
    let sync_run_repo = Arc::new(SyncRunRepository::new(pool.clone(), writer.clone()));
    let audit_repo = Arc::new(AuditRepository::new(pool.clone(), writer.clone()));
    let invoice_repo = Arc::new(InvoiceRepository::new(pool.clone(), writer.clone()));

    let settings = config.provider.as_ref().map(|p| IntegrationSettings {
        client_id: p.client_id.clone(),
        redirect_uri: p.redirect_uri.clone(),
        authorize_endpoint: format!("{}/oauth/authorize", p.auth_base_url),
    });

    let provider: Arc<dyn BankingProvider> = match provider {
        Some(provider) => provider,
        None => {
            let (api_url, auth_url, client_id) = match &config.provider {
                Some(p) => (
                    p.api_base_url.clone(),
                    p.auth_base_url.clone(),
                    p.client_id.clone(),
                ),
                // Disabled integration: the client is never reached because
                // every operation fails NotConfigured first.
                None => (
                    ledgerdesk_banking::SANDBOX_API_URL.to_string(),
                    ledgerdesk_banking::SANDBOX_AUTH_URL.to_string(),
                    String::new(),
                ),
            };
            Arc::new(BankingApiClient::new(&api_url, &auth_url, &client_id))
        }
    };

    let connection_service = Arc::new(ConnectionService::new(
        connection_repo.clone(),
        provider.clone(),
        vault,
        settings,
    ));

    let sync_service = Arc::new(SyncService::new(
        connection_service.clone(),
        connection_repo.clone(),
        account_repo,
        transaction_repo.clone(),
        sync_run_repo,
        provider.clone(),
    ));

    let payment_service = Arc::new(PaymentService::new(
        payment_repo.clone(),
        connection_service.clone(),
        provider,
    ));

    let webhook_service = Arc::new(WebhookService::new(
        transaction_repo,
        payment_repo,
        invoice_repo,
        audit_repo,
    ));

    Ok(Arc::new(AppState {
        config,
        connection_repo,
        connection_service,
        sync_service,
        payment_service,
        webhook_service,
    }))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::banking::router())
        .merge(api::webhooks::router())
        .with_state(state)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr.clone();
    let state = build_state(config, None)?;

    scheduler::spawn(state.clone());

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("[Server] listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
