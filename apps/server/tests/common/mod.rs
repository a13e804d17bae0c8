//! Shared harness: a stubbed banking provider over a real migrated database.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal_macros::dec;

use ledgerdesk_core::membership::{Membership, Role};
use ledgerdesk_core::providers::{
    BankingProvider, PaymentOrder, ProviderAccount, ProviderPayment, ProviderTransaction,
    TokenGrant,
};
use ledgerdesk_core::transactions::TransactionState;
use ledgerdesk_core::{Error, Result};
use ledgerdesk_server::config::{Config, ProviderConfig};
use ledgerdesk_server::{build_state, AppState};
use ledgerdesk_storage_sqlite::accounts::AccountRepository;
use ledgerdesk_storage_sqlite::audit::AuditRepository;
use ledgerdesk_storage_sqlite::invoices::InvoiceRepository;
use ledgerdesk_storage_sqlite::payments::PaymentRepository;
use ledgerdesk_storage_sqlite::sync_runs::SyncRunRepository;
use ledgerdesk_storage_sqlite::transactions::TransactionRepository;
use ledgerdesk_storage_sqlite::{create_pool, spawn_writer, SqlitePool, WriteHandle};

pub const WEBHOOK_SECRET: &str = "whsec_test123secret456";

/// In-memory stand-in for the banking platform.
#[derive(Default)]
pub struct StubProvider {
    pub accounts: Mutex<Vec<ProviderAccount>>,
    pub transactions: Mutex<Vec<ProviderTransaction>>,
    pub access_token_ttl: Mutex<Option<i64>>,
    pub fail_accounts: Mutex<bool>,
    pub fail_refresh: Mutex<bool>,
    pub refresh_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            access_token_ttl: Mutex::new(Some(3600)),
            ..Self::default()
        }
    }

    pub fn set_accounts(&self, accounts: Vec<ProviderAccount>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_transactions(&self, transactions: Vec<ProviderTransaction>) {
        *self.transactions.lock().unwrap() = transactions;
    }
}

#[async_trait]
impl BankingProvider for StubProvider {
    async fn exchange_authorization_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenGrant> {
        Ok(TokenGrant {
            access_token: "stub-access-token".to_string(),
            refresh_token: "stub-refresh-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: *self.access_token_ttl.lock().unwrap(),
            refresh_expires_in: None,
        })
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<TokenGrant> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_refresh.lock().unwrap() {
            return Err(Error::RefreshFailed("invalid_grant".to_string()));
        }
        Ok(TokenGrant {
            access_token: "stub-refreshed-access-token".to_string(),
            refresh_token: "stub-rotated-refresh-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: Some(3600),
            refresh_expires_in: None,
        })
    }

    async fn list_accounts(&self, _access_token: &str) -> Result<Vec<ProviderAccount>> {
        if *self.fail_accounts.lock().unwrap() {
            return Err(Error::Provider("connection timed out".to_string()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn list_transactions(
        &self,
        _access_token: &str,
        _from: &str,
        _to: &str,
        _limit: i64,
    ) -> Result<Vec<ProviderTransaction>> {
        Ok(self.transactions.lock().unwrap().clone())
    }

    async fn submit_payment(
        &self,
        _access_token: &str,
        order: &PaymentOrder,
    ) -> Result<ProviderPayment> {
        Ok(ProviderPayment {
            external_id: format!("ext-{}", order.request_id),
            status: ledgerdesk_core::payments::PaymentStatus::Processing,
        })
    }
}

/// Application state plus direct repository access for assertions.
pub struct TestContext {
    pub state: Arc<AppState>,
    pub provider: Arc<StubProvider>,
    pub pool: Arc<SqlitePool>,
    pub writer: WriteHandle,
    _dir: std::path::PathBuf,
}

impl TestContext {
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn sync_runs(&self) -> SyncRunRepository {
        SyncRunRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn audit(&self) -> AuditRepository {
        AuditRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone(), self.writer.clone())
    }
}

pub fn setup() -> TestContext {
    let dir = tempfile::tempdir().expect("tempdir").keep();
    let db_path = dir.join("ledgerdesk-test.db");
    let db_path_str = db_path.to_str().expect("utf8 path").to_string();

    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        db_path: db_path_str.clone(),
        settings_url: "/settings/banking".to_string(),
        vault_key: Some("integration-test-vault-key".to_string()),
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        provider: Some(ProviderConfig {
            client_id: "test-client-id".to_string(),
            redirect_uri: "http://localhost:8700/banking/callback".to_string(),
            api_base_url: "https://api.sandbox.nordbank.com".to_string(),
            auth_base_url: "https://auth.sandbox.nordbank.com".to_string(),
            sandbox: true,
        }),
        sync_interval_secs: 0,
    };

    let provider = Arc::new(StubProvider::new());
    let state = build_state(config, Some(provider.clone() as Arc<dyn BankingProvider>))
        .expect("build state");

    // Separate pool over the same file for assertions.
    let pool = create_pool(&db_path_str).expect("pool");
    let writer = spawn_writer(pool.as_ref().clone());

    TestContext {
        state,
        provider,
        pool,
        writer,
        _dir: dir,
    }
}

pub fn owner(tenant: &str) -> Membership {
    Membership::new(tenant, Role::Owner)
}

pub fn member(tenant: &str) -> Membership {
    Membership::new(tenant, Role::Member)
}

/// Drive the full OAuth flow for a tenant against the stub provider.
pub async fn connect_tenant(ctx: &TestContext, tenant: &str) {
    let membership = owner(tenant);
    let url = ctx
        .state
        .connection_service
        .initiate(&membership)
        .await
        .expect("initiate");
    let state_token = url.split("state=").nth(1).expect("state param");

    ctx.state
        .connection_service
        .complete_callback(&membership, Some("auth-code-1"), Some(state_token))
        .await
        .expect("callback");
}

pub fn provider_account(external_id: &str, name: &str) -> ProviderAccount {
    ProviderAccount {
        external_id: external_id.to_string(),
        name: name.to_string(),
        iban: Some("NL02ABNA0123456789".to_string()),
        balance: dec!(1000.00),
        currency: "EUR".to_string(),
        account_kind: Some("current".to_string()),
    }
}

pub fn provider_transaction(external_id: &str, account_external_id: &str) -> ProviderTransaction {
    ProviderTransaction {
        external_id: external_id.to_string(),
        account_external_id: account_external_id.to_string(),
        amount: dec!(-12.30),
        currency: "EUR".to_string(),
        state: TransactionState::Booked,
        description: Some("Coffee beans".to_string()),
        counterparty: Some("Roastery BV".to_string()),
        booked_at: Some("2026-02-01T09:30:00+00:00".to_string()),
    }
}
