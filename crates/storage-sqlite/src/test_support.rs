//! Shared setup for repository tests.

use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use uuid::Uuid;

use crate::db::{create_pool, get_connection, run_migrations, write_actor::spawn_writer, WriteHandle};

/// Fresh migrated database in a throwaway directory.
pub fn setup_db() -> (Arc<Pool<ConnectionManager<SqliteConnection>>>, WriteHandle) {
    let dir = tempfile::tempdir().expect("tempdir").keep();
    let db_path = dir.join("ledgerdesk-test.db");
    let pool = create_pool(db_path.to_str().expect("utf8 path")).expect("create pool");
    run_migrations(&pool).expect("migrate db");
    let writer = spawn_writer(pool.as_ref().clone());
    (pool, writer)
}

/// Insert a minimal mirrored account and return its local id.
pub fn seed_account(
    pool: &Arc<Pool<ConnectionManager<SqliteConnection>>>,
    tenant: &str,
    external: &str,
) -> String {
    use crate::schema::bank_accounts;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let mut conn = get_connection(pool).expect("conn");
    diesel::insert_into(bank_accounts::table)
        .values((
            bank_accounts::id.eq(&id),
            bank_accounts::tenant_id.eq(tenant),
            bank_accounts::external_id.eq(external),
            bank_accounts::name.eq("Seed account"),
            bank_accounts::balance.eq("0"),
            bank_accounts::currency.eq("EUR"),
            bank_accounts::created_at.eq(&now),
            bank_accounts::updated_at.eq(&now),
        ))
        .execute(&mut conn)
        .expect("seed account");
    id
}
