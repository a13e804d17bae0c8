//! Inbound webhook endpoint for the banking platform.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, error, warn};

use ledgerdesk_core::webhooks::{verify_signature, EventDisposition, WebhookEvent};

use crate::main_lib::AppState;

/// Header carrying the provider's hex HMAC-SHA256 signature.
const SIGNATURE_HEADER: &str = "x-signature";

/// Liveness probe used by the provider before enabling deliveries.
async fn webhook_probe() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Authentication boundary: with a configured secret, an absent or
    // mismatched signature means the payload is never even parsed.
    if let Some(secret) = &state.config.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() || !verify_signature(secret, signature, &body) {
            warn!("[Webhook] rejected delivery with missing or invalid signature");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid signature" })),
            )
                .into_response();
        }
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!("[Webhook] unparseable payload: {}", err);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid payload" })),
            )
                .into_response();
        }
    };

    // Internal failures stay internal: anything past signature and parse
    // checks acknowledges the delivery so the provider does not retry-storm.
    match state.webhook_service.process_event(&event).await {
        Ok(EventDisposition::Applied) => {
            debug!("[Webhook] applied event {}", event.event);
        }
        Ok(EventDisposition::Ignored(reason)) => {
            debug!("[Webhook] ignored event {}: {}", event.event, reason);
        }
        Err(err) => {
            error!("[Webhook] processing {} failed: {}", event.event, err);
        }
    }

    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/webhooks/banking",
        get(webhook_probe).post(receive_webhook),
    )
}
