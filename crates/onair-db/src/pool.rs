//! r2d2 pooling for the onair SQLite database.
//!
//! Every pooled connection enforces foreign keys, and pools are only handed
//! out after the schema is migrated.

use onair_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const FILE_POOL_SIZE: u32 = 4;

/// Open (or create) the database file at `db_path` and migrate it.
///
/// ```no_run
/// use onair_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/onair/onair.db").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    build(SqliteConnectionManager::file(db_path), FILE_POOL_SIZE)
}

/// A migrated in-memory database.
///
/// Limited to one connection since each in-memory connection is a separate
/// database.
///
/// ```
/// use onair_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    build(SqliteConnectionManager::memory(), 1)
}

fn build(manager: SqliteConnectionManager, max_size: u32) -> Result<DbPool> {
    let manager = manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| Error::database(format!("Cannot build connection pool: {}", e)))?;

    let conn = get_conn(&pool)?;
    let applied = migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Schema migration failed: {}", e)))?;
    if applied > 0 {
        tracing::debug!(applied, "Database schema migrated");
    }
    drop(conn);

    Ok(pool)
}

/// Check a connection out of `pool`.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("No database connection available: {}", e)))
}
