//! Reconciliation of inbound provider events against local records.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::audit::{AuditLogPort, NewAuditEvent};
use crate::invoices::InvoiceStatusPort;
use crate::payments::{
    resolve_payment, Payment, PaymentLookup, PaymentRepositoryTrait, PaymentStatus,
};
use crate::transactions::{StateApplyOutcome, TransactionRepositoryTrait, TransactionState};
use crate::Result;

use super::WebhookEvent;

/// How an event was handled. `Ignored` events are still acknowledged to the
/// provider; the reason is only for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Applied,
    Ignored(&'static str),
}

pub struct WebhookService {
    transactions: Arc<dyn TransactionRepositoryTrait>,
    payments: Arc<dyn PaymentRepositoryTrait>,
    invoices: Arc<dyn InvoiceStatusPort>,
    audit: Arc<dyn AuditLogPort>,
}

impl WebhookService {
    pub fn new(
        transactions: Arc<dyn TransactionRepositoryTrait>,
        payments: Arc<dyn PaymentRepositoryTrait>,
        invoices: Arc<dyn InvoiceStatusPort>,
        audit: Arc<dyn AuditLogPort>,
    ) -> Self {
        Self {
            transactions,
            payments,
            invoices,
            audit,
        }
    }

    /// Apply a verified event. Unmatched entities and unhandled event types
    /// are no-ops; only genuine storage failures surface as errors.
    pub async fn process_event(&self, event: &WebhookEvent) -> Result<EventDisposition> {
        if event.event.starts_with("transaction.") {
            self.apply_transaction_event(event).await
        } else if event.event.starts_with("payment.") {
            self.apply_payment_event(event).await
        } else {
            log::debug!("[Webhook] ignoring event type {}", event.event);
            Ok(EventDisposition::Ignored("unhandled event type"))
        }
    }

    async fn apply_transaction_event(&self, event: &WebhookEvent) -> Result<EventDisposition> {
        let Some(state) = event
            .data
            .status
            .as_deref()
            .and_then(TransactionState::from_wire)
        else {
            log::debug!(
                "[Webhook] transaction event {} carries no usable state",
                event.data.id
            );
            return Ok(EventDisposition::Ignored("no usable transaction state"));
        };

        match self
            .transactions
            .apply_state_by_external_id(&event.data.id, state)
            .await?
        {
            StateApplyOutcome::Applied => Ok(EventDisposition::Applied),
            StateApplyOutcome::SkippedTerminal => {
                log::debug!(
                    "[Webhook] transaction {} already terminal, skipping {}",
                    event.data.id,
                    state.as_str()
                );
                Ok(EventDisposition::Ignored("terminal state kept"))
            }
            StateApplyOutcome::Missing => {
                // The transaction may simply not have synced yet.
                log::debug!("[Webhook] no mirrored transaction {}", event.data.id);
                Ok(EventDisposition::Ignored("transaction not mirrored"))
            }
        }
    }

    async fn apply_payment_event(&self, event: &WebhookEvent) -> Result<EventDisposition> {
        let Some(new_status) = payment_status_for(event) else {
            log::debug!(
                "[Webhook] payment event {} carries no usable status",
                event.event
            );
            return Ok(EventDisposition::Ignored("no usable payment status"));
        };

        let payment = match resolve_payment(self.payments.as_ref(), &event.data.id)? {
            PaymentLookup::FoundByExternalId(payment) => payment,
            PaymentLookup::FoundByRequestId(payment) => payment,
            PaymentLookup::NotFound => {
                log::debug!("[Webhook] no payment matches reference {}", event.data.id);
                return Ok(EventDisposition::Ignored("payment not found"));
            }
        };

        if payment.status.is_terminal() {
            return self.handle_terminal_revisit(event, &payment, new_status).await;
        }

        let completed_at = if new_status == PaymentStatus::Completed {
            Some(
                event
                    .data
                    .completed_at
                    .clone()
                    .unwrap_or_else(|| Utc::now().to_rfc3339()),
            )
        } else {
            None
        };

        self.payments
            .update_status(
                &payment.id,
                new_status,
                event.data.reason_code.clone(),
                completed_at.clone(),
            )
            .await?;

        match new_status {
            PaymentStatus::Completed => {
                if let Some(invoice_id) = &payment.invoice_id {
                    let paid_at = completed_at.as_deref().unwrap_or_default().to_string();
                    if !self.invoices.mark_paid(invoice_id, &paid_at).await? {
                        log::warn!(
                            "[Webhook] payment {} references missing invoice {}",
                            payment.id,
                            invoice_id
                        );
                    }
                }
                self.audit
                    .append(NewAuditEvent::new(
                        &payment.tenant_id,
                        "payment.completed",
                        "payment",
                        &payment.id,
                        json!({
                            "amount": payment.amount,
                            "currency": payment.currency,
                            "invoiceId": payment.invoice_id,
                            "reference": event.data.id,
                        }),
                    ))
                    .await?;
                log::info!("[Webhook] payment {} completed", payment.id);
            }
            PaymentStatus::Failed | PaymentStatus::Cancelled => {
                self.audit
                    .append(NewAuditEvent::new(
                        &payment.tenant_id,
                        match new_status {
                            PaymentStatus::Cancelled => "payment.cancelled",
                            _ => "payment.failed",
                        },
                        "payment",
                        &payment.id,
                        json!({
                            "reasonCode": event.data.reason_code,
                            "reference": event.data.id,
                        }),
                    ))
                    .await?;
                log::info!(
                    "[Webhook] payment {} ended as {}",
                    payment.id,
                    new_status.as_str()
                );
            }
            // Pending/processing updates carry no side effects.
            _ => {}
        }

        Ok(EventDisposition::Applied)
    }

    /// A payment already terminal revisited by a later event. A repeat of
    /// the same state is idempotent; a *different* terminal state indicates
    /// duplicate or out-of-order delivery and is audited, not applied.
    async fn handle_terminal_revisit(
        &self,
        event: &WebhookEvent,
        payment: &Payment,
        new_status: PaymentStatus,
    ) -> Result<EventDisposition> {
        if new_status == payment.status {
            log::debug!(
                "[Webhook] payment {} already {}, event is a duplicate",
                payment.id,
                new_status.as_str()
            );
            return Ok(EventDisposition::Ignored("terminal state revisited"));
        }

        if new_status.is_terminal() {
            log::warn!(
                "[Webhook] payment {} reported {} but is already {}",
                payment.id,
                new_status.as_str(),
                payment.status.as_str()
            );
            self.audit
                .append(NewAuditEvent::new(
                    &payment.tenant_id,
                    "payment.state_anomaly",
                    "payment",
                    &payment.id,
                    json!({
                        "current": payment.status.as_str(),
                        "reported": new_status.as_str(),
                        "reference": event.data.id,
                    }),
                ))
                .await?;
            return Ok(EventDisposition::Applied);
        }

        log::debug!(
            "[Webhook] payment {} is terminal, ignoring regression to {}",
            payment.id,
            new_status.as_str()
        );
        Ok(EventDisposition::Ignored("terminal state cannot regress"))
    }
}

/// Target status implied by the event type, falling back to the payload's
/// own status field for generic `payment.updated`-style events.
fn payment_status_for(event: &WebhookEvent) -> Option<PaymentStatus> {
    match event.event.as_str() {
        "payment.completed" => Some(PaymentStatus::Completed),
        "payment.failed" => Some(PaymentStatus::Failed),
        "payment.cancelled" => Some(PaymentStatus::Cancelled),
        _ => event
            .data
            .status
            .as_deref()
            .and_then(PaymentStatus::from_wire),
    }
}
