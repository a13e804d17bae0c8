//! Pool construction and migrations.

pub mod write_actor;

pub use write_actor::{spawn_writer, WriteHandle};

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use r2d2::{Pool, PooledConnection};

use crate::errors::StorageError;
use ledgerdesk_core::Result;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas. Foreign keys are off by default in SQLite; the
/// busy timeout covers writer/reader handoff under WAL.
#[derive(Debug)]
struct SqliteCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqliteCustomizer {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn create_pool(db_path: &str) -> Result<Arc<SqlitePool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .connection_customizer(Box::new(SqliteCustomizer))
        .build(manager)
        .map_err(StorageError::from)?;
    Ok(Arc::new(pool))
}

pub fn get_connection(
    pool: &Arc<SqlitePool>,
) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>> {
    Ok(pool.get().map_err(StorageError::from)?)
}

pub fn run_migrations(pool: &Arc<SqlitePool>) -> Result<()> {
    let mut conn = get_connection(pool)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(())
}
