//! Environment configuration.

use ledgerdesk_banking::{DEFAULT_API_URL, DEFAULT_AUTH_URL, SANDBOX_API_URL, SANDBOX_AUTH_URL};

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_url(name: &str) -> Option<String> {
    env_string(name).map(|v| v.trim_end_matches('/').to_string())
}

fn env_flag(name: &str) -> bool {
    env_string(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Provider credentials. Absent entirely when no client id is configured,
/// which disables the integration rather than crashing at startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub api_base_url: String,
    pub auth_base_url: String,
    pub sandbox: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub db_path: String,
    /// Settings surface the OAuth endpoints redirect back to.
    pub settings_url: String,
    pub vault_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub provider: Option<ProviderConfig>,
    /// Seconds between scheduled syncs; 0 disables the scheduler.
    pub sync_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let sandbox = env_flag("BANKING_SANDBOX");

        let provider = env_string("BANKING_CLIENT_ID").map(|client_id| ProviderConfig {
            client_id,
            redirect_uri: env_url("BANKING_REDIRECT_URI")
                .unwrap_or_else(|| "http://localhost:8700/banking/callback".to_string()),
            api_base_url: env_url("BANKING_API_URL").unwrap_or_else(|| {
                (if sandbox { SANDBOX_API_URL } else { DEFAULT_API_URL }).to_string()
            }),
            auth_base_url: env_url("BANKING_AUTH_URL").unwrap_or_else(|| {
                (if sandbox { SANDBOX_AUTH_URL } else { DEFAULT_AUTH_URL }).to_string()
            }),
            sandbox,
        });

        Config {
            bind_addr: env_string("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8700".to_string()),
            db_path: env_string("LEDGERDESK_DB_PATH")
                .unwrap_or_else(|| "ledgerdesk.db".to_string()),
            settings_url: env_url("BANKING_SETTINGS_URL")
                .unwrap_or_else(|| "/settings/banking".to_string()),
            vault_key: env_string("BANKING_VAULT_KEY"),
            webhook_secret: env_string("BANKING_WEBHOOK_SECRET"),
            provider,
            sync_interval_secs: env_string("BANKING_SYNC_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }
}
