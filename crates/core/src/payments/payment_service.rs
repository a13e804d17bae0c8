//! Payment initiation.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::connections::ConnectionService;
use crate::membership::Membership;
use crate::providers::{BankingProvider, PaymentOrder};
use crate::{Error, Result};

use super::{NewPayment, Payment, PaymentRepositoryTrait, PaymentStatus};

/// Request to pay a counterparty, optionally tied to an invoice.
#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_name: String,
    pub counterparty_iban: String,
    pub description: Option<String>,
    pub invoice_id: Option<String>,
}

pub struct PaymentService {
    payments: Arc<dyn PaymentRepositoryTrait>,
    connections: Arc<ConnectionService>,
    provider: Arc<dyn BankingProvider>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepositoryTrait>,
        connections: Arc<ConnectionService>,
        provider: Arc<dyn BankingProvider>,
    ) -> Self {
        Self {
            payments,
            connections,
            provider,
        }
    }

    /// Submit an outbound payment.
    ///
    /// The local row is written before the provider call so a timeout still
    /// leaves an observable `pending` payment carrying its request id; the
    /// provider dedupes on that id if the order is retried.
    pub async fn initiate(
        &self,
        membership: &Membership,
        request: PaymentInitiation,
    ) -> Result<Payment> {
        if !membership.is_owner() {
            return Err(Error::Forbidden);
        }
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidRequest(
                "payment amount must be positive".to_string(),
            ));
        }
        if request.counterparty_iban.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "counterparty IBAN is required".to_string(),
            ));
        }

        let token = self
            .connections
            .get_valid_token(&membership.tenant_id)
            .await?;

        let mut payment = self
            .payments
            .insert_payment(NewPayment {
                tenant_id: membership.tenant_id.clone(),
                request_id: Uuid::new_v4().to_string(),
                invoice_id: request.invoice_id,
                amount: request.amount,
                currency: request.currency,
                counterparty_name: request.counterparty_name,
                counterparty_iban: request.counterparty_iban,
                description: request.description,
            })
            .await?;

        let order = PaymentOrder {
            request_id: payment.request_id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            counterparty_name: payment.counterparty_name.clone(),
            counterparty_iban: payment.counterparty_iban.clone(),
            description: payment.description.clone(),
        };

        match self.provider.submit_payment(&token, &order).await {
            Ok(submitted) => {
                self.payments
                    .assign_external_id(&payment.id, &submitted.external_id, submitted.status)
                    .await?;
                payment.external_id = Some(submitted.external_id);
                payment.status = submitted.status;
                Ok(payment)
            }
            Err(err) => {
                log::error!(
                    "[Payments] submission failed for payment {}: {}",
                    payment.id,
                    err
                );
                self.payments
                    .update_status(
                        &payment.id,
                        PaymentStatus::Failed,
                        Some(err.to_string()),
                        None,
                    )
                    .await?;
                Err(err)
            }
        }
    }
}
