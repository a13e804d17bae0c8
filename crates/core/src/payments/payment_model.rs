//! Payment domain model and repository contract.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Payment lifecycle. `Completed`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

/// An outbound payment initiated by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub tenant_id: String,
    /// Locally assigned idempotency key, set before the provider is called.
    pub request_id: String,
    /// Provider-assigned id; absent until the provider accepts the order.
    pub external_id: Option<String>,
    pub invoice_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_name: String,
    pub counterparty_iban: String,
    pub description: Option<String>,
    pub status: PaymentStatus,
    pub reason_code: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for a new payment row.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub tenant_id: String,
    pub request_id: String,
    pub invoice_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_name: String,
    pub counterparty_iban: String,
    pub description: Option<String>,
}

/// Result of resolving a payment by whichever identifier an event carried.
#[derive(Debug, Clone)]
pub enum PaymentLookup {
    FoundByExternalId(Payment),
    FoundByRequestId(Payment),
    NotFound,
}

#[async_trait]
pub trait PaymentRepositoryTrait: Send + Sync {
    async fn insert_payment(&self, new: NewPayment) -> Result<Payment>;

    /// Record the provider-assigned id once the order is accepted.
    async fn assign_external_id(
        &self,
        payment_id: &str,
        external_id: &str,
        status: PaymentStatus,
    ) -> Result<()>;

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Payment>>;

    fn find_by_request_id(&self, request_id: &str) -> Result<Option<Payment>>;

    fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<Payment>>;

    async fn update_status(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        reason_code: Option<String>,
        completed_at: Option<String>,
    ) -> Result<()>;
}

/// Resolve a payment by either identifier the provider may echo.
///
/// The external id takes precedence; the local request id covers events
/// emitted before the provider assigned one.
pub fn resolve_payment(
    repo: &dyn PaymentRepositoryTrait,
    reference: &str,
) -> Result<PaymentLookup> {
    if let Some(payment) = repo.find_by_external_id(reference)? {
        return Ok(PaymentLookup::FoundByExternalId(payment));
    }
    if let Some(payment) = repo.find_by_request_id(reference)? {
        return Ok(PaymentLookup::FoundByRequestId(payment));
    }
    Ok(PaymentLookup::NotFound)
}
