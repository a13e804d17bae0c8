//! Banking API client for communicating with the Nordbank platform.

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use async_trait::async_trait;

use ledgerdesk_core::providers::{
    BankingProvider, PaymentOrder, ProviderAccount, ProviderPayment, ProviderTransaction,
    TokenGrant,
};

use crate::error::{BankingApiError, Result};
use crate::types::*;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

pub const DEFAULT_API_URL: &str = "https://api.nordbank.com";
pub const DEFAULT_AUTH_URL: &str = "https://auth.nordbank.com";
pub const SANDBOX_API_URL: &str = "https://api.sandbox.nordbank.com";
pub const SANDBOX_AUTH_URL: &str = "https://auth.sandbox.nordbank.com";

/// Client for the Nordbank open-banking REST API.
///
/// Bearer tokens are supplied per call; the client holds no credentials
/// beyond the public client id used for token exchanges.
#[derive(Debug, Clone)]
pub struct BankingApiClient {
    client: reqwest::Client,
    api_base_url: String,
    auth_base_url: String,
    client_id: String,
}

impl BankingApiClient {
    pub fn new(api_base_url: &str, auth_base_url: &str, client_id: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            auth_base_url: auth_base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
        }
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Create headers for an authenticated API request.
    fn headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| BankingApiError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            // Try to parse a structured error body first
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(BankingApiError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(BankingApiError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            BankingApiError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // OAuth token endpoint
    // ─────────────────────────────────────────────────────────────────────

    /// Exchange an authorization code for a token pair.
    ///
    /// POST {auth}/oauth/token
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let url = format!("{}/oauth/token", self.auth_base_url);
        debug!("Exchanging authorization code");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", &self.client_id),
            ])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Exchange a refresh token for a rotated token pair.
    ///
    /// POST {auth}/oauth/token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let url = format!("{}/oauth/token", self.auth_base_url);
        debug!("Refreshing access token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
            ])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accounts & transactions
    // ─────────────────────────────────────────────────────────────────────

    /// List all accounts visible to the connection.
    ///
    /// GET {api}/v1/accounts
    pub async fn list_accounts(&self, token: &str) -> Result<Vec<ApiAccount>> {
        let url = format!("{}/v1/accounts", self.api_base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers(token)?)
            .send()
            .await?;

        let parsed: AccountsResponse = Self::parse_response(response).await?;
        Ok(parsed.accounts)
    }

    /// List transactions booked inside the window, newest first.
    ///
    /// GET {api}/v1/transactions?from=&to=&limit=
    pub async fn list_transactions(
        &self,
        token: &str,
        from: &str,
        to: &str,
        limit: i64,
    ) -> Result<Vec<ApiTransaction>> {
        let url = format!(
            "{}/v1/transactions?from={}&to={}&limit={}",
            self.api_base_url,
            urlencoding::encode(from),
            urlencoding::encode(to),
            limit
        );

        let response = self
            .client
            .get(&url)
            .headers(self.headers(token)?)
            .send()
            .await?;

        let parsed: TransactionsResponse = Self::parse_response(response).await?;
        Ok(parsed.transactions)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────

    /// Submit a payment order. The local request id rides along as the
    /// idempotency key so a retried submission cannot double-pay.
    ///
    /// POST {api}/v1/payments
    pub async fn submit_payment(
        &self,
        token: &str,
        order: &PaymentOrder,
    ) -> Result<PaymentResponse> {
        let url = format!("{}/v1/payments", self.api_base_url);
        debug!("Submitting payment order {}", order.request_id);

        let response = self
            .client
            .post(&url)
            .headers(self.headers(token)?)
            .header("Idempotency-Key", &order.request_id)
            .json(&serde_json::json!({
                "amount": order.amount,
                "currency": order.currency,
                "counterparty": {
                    "name": order.counterparty_name,
                    "iban": order.counterparty_iban,
                },
                "description": order.description,
                "end_to_end_id": order.request_id,
            }))
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[async_trait]
impl BankingProvider for BankingApiClient {
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> ledgerdesk_core::Result<TokenGrant> {
        let response = self.exchange_code(code, redirect_uri).await?;
        Ok(token_grant_from(response))
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> ledgerdesk_core::Result<TokenGrant> {
        let response = self
            .refresh_token(refresh_token)
            .await
            .map_err(|e| ledgerdesk_core::Error::RefreshFailed(e.to_string()))?;
        Ok(token_grant_from(response))
    }

    async fn list_accounts(
        &self,
        access_token: &str,
    ) -> ledgerdesk_core::Result<Vec<ProviderAccount>> {
        let accounts = BankingApiClient::list_accounts(self, access_token).await?;
        Ok(accounts
            .into_iter()
            .map(ApiAccount::into_provider_account)
            .collect())
    }

    async fn list_transactions(
        &self,
        access_token: &str,
        from: &str,
        to: &str,
        limit: i64,
    ) -> ledgerdesk_core::Result<Vec<ProviderTransaction>> {
        let transactions =
            BankingApiClient::list_transactions(self, access_token, from, to, limit).await?;
        Ok(transactions
            .into_iter()
            .map(ApiTransaction::into_provider_transaction)
            .collect())
    }

    async fn submit_payment(
        &self,
        access_token: &str,
        order: &PaymentOrder,
    ) -> ledgerdesk_core::Result<ProviderPayment> {
        let response = BankingApiClient::submit_payment(self, access_token, order).await?;
        let status = response.payment_status();
        Ok(ProviderPayment {
            external_id: response.id,
            status,
        })
    }
}

fn token_grant_from(response: TokenResponse) -> TokenGrant {
    TokenGrant {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
        expires_in: response.expires_in,
        refresh_expires_in: response.refresh_expires_in,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_are_trimmed() {
        let client = BankingApiClient::new(
            "https://api.sandbox.nordbank.com/",
            "https://auth.sandbox.nordbank.com/",
            "client-1",
        );
        assert_eq!(client.api_base_url, "https://api.sandbox.nordbank.com");
        assert_eq!(client.auth_base_url, "https://auth.sandbox.nordbank.com");
    }

    #[test]
    fn token_grant_defaults_bearer_type() {
        let grant = token_grant_from(TokenResponse {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: None,
            expires_in: Some(3600),
            refresh_expires_in: None,
        });
        assert_eq!(grant.token_type, "Bearer");
    }
}
