//! SQLite storage for the banking integration.
//!
//! Repositories implement the traits from `ledgerdesk-core`. Reads go
//! through the r2d2 pool; every write is funneled through the single
//! writer actor in [`db::write_actor`].

pub mod accounts;
pub mod audit;
pub mod connections;
pub mod db;
pub mod errors;
pub mod invoices;
pub mod payments;
pub mod schema;
pub mod sync_runs;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_support;

pub use db::{create_pool, get_connection, run_migrations, SqlitePool};
pub use db::write_actor::{spawn_writer, WriteHandle};
pub use errors::StorageError;
