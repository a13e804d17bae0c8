//! Polling synchronization engine.

mod sync_run_model;
mod sync_service;

pub use sync_run_model::*;
pub use sync_service::*;
