//! Inbound event envelope.

use serde::Deserialize;

/// Event envelope as delivered by the provider. Only the fields the
/// reconciler consumes are modeled; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Dotted event type, e.g. `transaction.updated` or `payment.completed`.
    pub event: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// Entity reference: a provider external id, or for payment events
    /// possibly the local request id, depending on event flavor.
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_with_minimal_fields() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"event":"transaction.updated","data":{"id":"tx_1"}}"#)
                .expect("parse");
        assert_eq!(event.event, "transaction.updated");
        assert_eq!(event.data.id, "tx_1");
        assert!(event.data.status.is_none());
    }

    #[test]
    fn envelope_parses_payment_fields() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "event": "payment.failed",
                "timestamp": "2026-03-01T10:00:00Z",
                "data": {"id": "pay_9", "status": "failed", "reason_code": "insufficient_funds"}
            }"#,
        )
        .expect("parse");
        assert_eq!(event.data.reason_code.as_deref(), Some("insufficient_funds"));
    }
}
