//! Open the shared store: busy timeout, WAL, schema.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use crate::engine::clock::Clock;
use crate::engine::partition::SearchSpace;
use crate::utils::config::DB_BUSY_TIMEOUT;

use super::{SCHEMA, SqliteStore, WAL_PRAGMAS};

/// Enable WAL and apply schema to an open connection (idempotent).
fn apply_wal_and_schema(conn: &Connection) -> Result<()> {
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .context("enable WAL")?;
    conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(())
}

/// Open or create the store at `path`. Busy timeout is set first so that several workers
/// opening the same file at once wait on each other instead of failing.
pub fn open_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("open database {}", path.display()))?;
    conn.busy_timeout(DB_BUSY_TIMEOUT)
        .context("set busy timeout")?;
    apply_wal_and_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory DB with the same schema (tests; no WAL pragmas needed).
pub fn open_db_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("enable foreign keys")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(conn)
}

pub fn open_store(path: &Path, space: SearchSpace, clock: Arc<dyn Clock>) -> Result<SqliteStore> {
    Ok(SqliteStore::new(open_db(path)?, space, clock))
}

pub fn open_store_in_memory(space: SearchSpace, clock: Arc<dyn Clock>) -> Result<SqliteStore> {
    Ok(SqliteStore::new(open_db_in_memory()?, space, clock))
}
