//! Database operations: schema, open, and the SQLite-backed file and batch queues.

mod batch_queue;
mod connection;
mod file_queue;

pub use connection::{open_db, open_db_in_memory, open_store, open_store_in_memory};

use rusqlite::Connection;
use rusqlite::types::Type;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::clock::{Clock, from_millis};
use crate::engine::partition::SearchSpace;
use crate::{Batch, BatchStatus, FileStatus, FileTask, Outcome, PasscodeRange, PasscodeRequirement};

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        PRAGMA foreign_keys = ON;
        "#;

/// Schema for file_list and trial_batches. Timestamps are epoch milliseconds.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS file_list (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path TEXT NOT NULL UNIQUE,
    file_hash TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('PENDING', 'IN_PROGRESS', 'COMPLETED', 'FAILED')),
    has_password INTEGER NOT NULL DEFAULT 0,
    password_found TEXT DEFAULT NULL,
    error TEXT DEFAULT NULL,
    started_at INTEGER DEFAULT NULL,
    completed_at INTEGER DEFAULT NULL,
    total_time_minutes REAL DEFAULT NULL,
    instance_id TEXT DEFAULT NULL
);
CREATE INDEX IF NOT EXISTS idx_file_list_hash ON file_list(file_hash);
CREATE INDEX IF NOT EXISTS idx_file_list_status ON file_list(status, id);

CREATE TABLE IF NOT EXISTS trial_batches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES file_list(id),
    batch_index INTEGER NOT NULL,
    range_from TEXT NOT NULL,
    range_to TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('PENDING', 'CHECKED_OUT', 'COMPLETED')),
    checked_out_at INTEGER DEFAULT NULL,
    completed_at INTEGER DEFAULT NULL,
    instance_id TEXT DEFAULT NULL,
    UNIQUE(file_id, batch_index)
);
CREATE INDEX IF NOT EXISTS idx_trial_batches_status ON trial_batches(status, file_id, batch_index);
"#;

pub(crate) const FILE_COLUMNS: &str = "id, file_path, file_hash, status, has_password, password_found, error, started_at, completed_at, total_time_minutes, instance_id";

pub(crate) const BATCH_COLUMNS: &str = "id, file_id, batch_index, range_from, range_to, status, checked_out_at, completed_at, instance_id";

/// One worker's handle on the shared store. Implements both [`crate::engine::FileQueue`] and
/// [`crate::engine::BatchQueue`]; open one per worker (connections are not shared across threads).
pub struct SqliteStore {
    conn: Connection,
    clock: Arc<dyn Clock>,
    space: SearchSpace,
}

impl SqliteStore {
    pub fn new(conn: Connection, space: SearchSpace, clock: Arc<dyn Clock>) -> Self {
        Self { conn, clock, space }
    }

    pub fn space(&self) -> SearchSpace {
        self.space
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

fn bad_enum(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown status {value:?}").into(),
    )
}

/// Map a row selected with [`FILE_COLUMNS`].
pub(crate) fn file_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileTask> {
    let status: String = row.get(3)?;
    let status = FileStatus::from_db_str(&status).ok_or_else(|| bad_enum(3, &status))?;
    let password_found: Option<String> = row.get(5)?;
    let error: Option<String> = row.get(6)?;
    let outcome = if status.is_terminal() {
        password_found.map(|p| Outcome::from_record(&p, error))
    } else {
        None
    };
    Ok(FileTask {
        id: row.get(0)?,
        path: PathBuf::from(row.get::<_, String>(1)?),
        fingerprint: row.get(2)?,
        status,
        passcode_required: PasscodeRequirement::from_db_int(row.get(4)?),
        outcome,
        started_at: row.get::<_, Option<i64>>(7)?.map(from_millis),
        completed_at: row.get::<_, Option<i64>>(8)?.map(from_millis),
        duration_minutes: row.get(9)?,
        owner: row.get(10)?,
    })
}

/// Map a row selected (or returned) with [`BATCH_COLUMNS`].
pub(crate) fn batch_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Batch> {
    let status: String = row.get(5)?;
    let status = BatchStatus::from_db_str(&status).ok_or_else(|| bad_enum(5, &status))?;
    Ok(Batch {
        id: row.get(0)?,
        file_id: row.get(1)?,
        index: row.get(2)?,
        range: PasscodeRange::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
        status,
        checked_out_at: row.get::<_, Option<i64>>(6)?.map(from_millis),
        completed_at: row.get::<_, Option<i64>>(7)?.map(from_millis),
        owner: row.get(8)?,
    })
}
