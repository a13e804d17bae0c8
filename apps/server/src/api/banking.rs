//! Banking integration endpoints: connect, callback, disconnect, sync and
//! payment initiation.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use ledgerdesk_core::payments::PaymentInitiation;
use ledgerdesk_core::sync::SyncType;
use ledgerdesk_core::Error as CoreError;

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

use super::Caller;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest {
    #[serde(default)]
    pub delete_data: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisconnectResponse {
    success: bool,
    data_deleted: bool,
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    success: bool,
    accounts_synced: usize,
    transactions_synced: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionStatusResponse {
    configured: bool,
    status: ledgerdesk_core::connections::ConnectionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_name: String,
    pub counterparty_iban: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentResponse {
    id: String,
    request_id: String,
    external_id: Option<String>,
    status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Flow
// ─────────────────────────────────────────────────────────────────────────────

fn settings_redirect(state: &AppState, query: &str) -> Redirect {
    Redirect::temporary(&format!("{}?{}", state.config.settings_url, query))
}

/// Connection state for the settings surface.
async fn connection_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<ConnectionStatusResponse>> {
    let status = state
        .connection_service
        .status(&caller.0.tenant_id)
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(ConnectionStatusResponse {
        configured: state.config.provider.is_some(),
        status,
    }))
}

async fn connect_bank(State(state): State<Arc<AppState>>, caller: Caller) -> Response {
    match state.connection_service.initiate(&caller.0).await {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(CoreError::AlreadyConnected) => {
            settings_redirect(&state, "error=already_connected").into_response()
        }
        Err(CoreError::Forbidden) => {
            ApiError::Forbidden("connecting a bank requires the owner role".to_string())
                .into_response()
        }
        Err(err) => {
            error!("[Banking] failed to initiate authorization: {}", err);
            settings_redirect(&state, "error=oauth_failed").into_response()
        }
    }
}

fn callback_error_reason(err: &CoreError) -> &'static str {
    match err {
        CoreError::InvalidCallback => "invalid_callback",
        CoreError::StateMismatch => "state_mismatch",
        CoreError::SessionExpired => "session_expired",
        CoreError::Storage(_) => "storage_failed",
        _ => "callback_failed",
    }
}

async fn banking_callback(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if let Some(error) = query.error {
        warn!(
            "[Banking] provider denied authorization: {} ({})",
            error,
            query.error_description.as_deref().unwrap_or("no detail")
        );
        return settings_redirect(&state, "error=oauth_denied");
    }

    match state
        .connection_service
        .complete_callback(&caller.0, query.code.as_deref(), query.state.as_deref())
        .await
    {
        Ok(_) => {
            info!("[Banking] connection established");
            settings_redirect(&state, "success=connected")
        }
        Err(err) => {
            error!("[Banking] callback failed: {}", err);
            settings_redirect(
                &state,
                &format!("error={}", callback_error_reason(&err)),
            )
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Disconnect / Sync / Payments
// ─────────────────────────────────────────────────────────────────────────────

async fn disconnect_bank(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: Option<Json<DisconnectRequest>>,
) -> ApiResult<Json<DisconnectResponse>> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    match state
        .connection_service
        .disconnect(&caller.0, request.delete_data)
        .await
    {
        Ok(outcome) => Ok(Json(DisconnectResponse {
            success: true,
            data_deleted: outcome.data_deleted,
        })),
        Err(CoreError::NoConnection) => Err(ApiError::coded(
            StatusCode::NOT_FOUND,
            "NO_CONNECTION",
            "no bank connection exists for this tenant",
        )),
        Err(CoreError::Forbidden) => Err(ApiError::Forbidden(
            "disconnecting requires the owner role".to_string(),
        )),
        Err(err) => {
            error!("[Banking] disconnect failed: {}", err);
            let code = if request.delete_data {
                "DELETE_FAILED"
            } else {
                "UPDATE_FAILED"
            };
            Err(ApiError::coded(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                err.to_string(),
            ))
        }
    }
}

async fn sync_bank_data(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<SyncResponse>> {
    if !caller.0.is_owner() {
        return Err(ApiError::Forbidden(
            "triggering a sync requires the owner role".to_string(),
        ));
    }

    info!("[Banking] manual sync requested for tenant {}", caller.0.tenant_id);

    match state
        .sync_service
        .run_sync(&caller.0.tenant_id, SyncType::Manual)
        .await
    {
        Ok(outcome) => Ok(Json(SyncResponse {
            success: true,
            accounts_synced: outcome.accounts_synced,
            transactions_synced: outcome.transactions_synced,
        })),
        Err(CoreError::NoConnection) => Err(ApiError::coded(
            StatusCode::NOT_FOUND,
            "NO_CONNECTION",
            "no active bank connection",
        )),
        Err(err) => {
            error!("[Banking] manual sync failed: {}", err);
            Err(ApiError::coded(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SYNC_FAILED",
                err.to_string(),
            ))
        }
    }
}

async fn create_payment(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult<Json<CreatePaymentResponse>> {
    let payment = state
        .payment_service
        .initiate(
            &caller.0,
            PaymentInitiation {
                amount: request.amount,
                currency: request.currency,
                counterparty_name: request.counterparty_name,
                counterparty_iban: request.counterparty_iban,
                description: request.description,
                invoice_id: request.invoice_id,
            },
        )
        .await
        .map_err(|err| match err {
            CoreError::Forbidden => {
                ApiError::Forbidden("initiating payments requires the owner role".to_string())
            }
            CoreError::NoConnection => ApiError::coded(
                StatusCode::NOT_FOUND,
                "NO_CONNECTION",
                "no active bank connection",
            ),
            CoreError::InvalidRequest(message) => ApiError::BadRequest(message),
            other => {
                error!("[Banking] payment initiation failed: {}", other);
                ApiError::coded(
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_FAILED",
                    other.to_string(),
                )
            }
        })?;

    Ok(Json(CreatePaymentResponse {
        id: payment.id,
        request_id: payment.request_id,
        external_id: payment.external_id,
        status: payment.status.as_str().to_string(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/banking/status", get(connection_status))
        .route("/banking/connect", get(connect_bank))
        .route("/banking/callback", get(banking_callback))
        .route("/banking/disconnect", post(disconnect_bank))
        .route("/banking/sync", post(sync_bank_data))
        .route("/banking/payments", post(create_payment))
}
