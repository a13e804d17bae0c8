//! HTTP client for the Nordbank open-banking API.
//!
//! Wraps the provider's REST endpoints (token exchange, account and
//! transaction listing, payment submission) and normalizes raw payloads
//! into the records the integration core works with.

mod client;
mod error;
mod types;

pub use client::{
    BankingApiClient, DEFAULT_API_URL, DEFAULT_AUTH_URL, SANDBOX_API_URL, SANDBOX_AUTH_URL,
};
pub use error::{BankingApiError, Result};
pub use types::*;
