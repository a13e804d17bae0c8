//! Core domain logic for the Ledgerdesk banking integration.
//!
//! This crate owns the connection lifecycle, the sync engine, payment
//! tracking and webhook reconciliation. Storage and the provider HTTP
//! client plug in through the traits defined here.

pub mod accounts;
pub mod audit;
pub mod connections;
pub mod errors;
pub mod invoices;
pub mod membership;
pub mod payments;
pub mod providers;
pub mod sync;
pub mod transactions;
pub mod vault;
pub mod webhooks;

pub use errors::{Error, Result};
