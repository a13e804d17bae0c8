//! Outbound payments.

mod payment_model;
mod payment_service;

pub use payment_model::*;
pub use payment_service::*;
