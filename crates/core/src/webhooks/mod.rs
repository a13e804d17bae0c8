//! Webhook verification and reconciliation.

mod event_model;
mod signature;
mod webhook_service;

pub use event_model::*;
pub use signature::*;
pub use webhook_service::*;
