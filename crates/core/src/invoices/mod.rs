//! Boundary to the application's invoice records.
//!
//! Invoicing itself lives outside this subsystem; reconciliation only needs
//! to flip an invoice to paid when a linked payment completes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Open,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Open => "open",
            InvoiceStatus::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub tenant_id: String,
    pub status: InvoiceStatus,
    pub total: Decimal,
    pub currency: String,
    pub paid_at: Option<String>,
}

#[async_trait]
pub trait InvoiceStatusPort: Send + Sync {
    /// Mark an invoice paid. Returns `false` when no such invoice exists.
    async fn mark_paid(&self, invoice_id: &str, paid_at: &str) -> Result<bool>;

    fn find_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>>;
}
