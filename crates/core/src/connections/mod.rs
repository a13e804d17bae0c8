//! Bank connection lifecycle.

mod connection_model;
mod connection_service;

pub use connection_model::*;
pub use connection_service::*;
