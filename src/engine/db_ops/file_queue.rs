//! File queue over `file_list`.

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{OptionalExtension, params};
use std::path::Path;
use std::time::Duration;

use crate::engine::queue::FileQueue;
use crate::{FileId, FileTask, Outcome, PasscodeRequirement, WorkerId};

use super::{FILE_COLUMNS, SqliteStore, file_from_row};

impl SqliteStore {
    fn query_one_file(&self, sql: &str) -> Result<Option<FileTask>> {
        self.conn
            .query_row(sql, [], file_from_row)
            .optional()
            .context("select file")
    }
}

impl FileQueue for SqliteStore {
    fn add_if_new(&self, path: &Path, fingerprint: &str) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO file_list (file_path, file_hash, status) VALUES (?1, ?2, 'PENDING')",
                params![path.to_string_lossy().as_ref(), fingerprint],
            )
            .context("insert file")?;
        Ok(inserted == 1)
    }

    fn next_to_process(&self) -> Result<Option<FileTask>> {
        let pending = format!(
            "SELECT {FILE_COLUMNS} FROM file_list WHERE status = 'PENDING' ORDER BY id LIMIT 1"
        );
        if let Some(file) = self.query_one_file(&pending)? {
            return Ok(Some(file));
        }
        // Resume a file that was started but still has unleased work.
        let resumable = format!(
            "SELECT {FILE_COLUMNS} FROM file_list f
             WHERE f.status = 'IN_PROGRESS'
               AND EXISTS (
                   SELECT 1 FROM trial_batches b
                   WHERE b.file_id = f.id AND b.status = 'PENDING'
               )
             ORDER BY f.id LIMIT 1"
        );
        self.query_one_file(&resumable)
    }

    fn mark_in_progress(&self, file_id: FileId, worker: &WorkerId) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE file_list
                 SET status = 'IN_PROGRESS', started_at = COALESCE(started_at, ?1), instance_id = ?2
                 WHERE id = ?3 AND status IN ('PENDING', 'IN_PROGRESS')",
                params![self.now_ms(), worker.as_str(), file_id],
            )
            .context("mark file in progress")?;
        if changed == 0 {
            debug!("file {file_id} already terminal; not marked in progress");
        }
        Ok(())
    }

    fn record_result(&self, file_id: FileId, outcome: &Outcome, duration: Duration) -> Result<bool> {
        let error = match outcome {
            Outcome::Unreadable(reason) => Some(reason.as_str()),
            _ => None,
        };
        let changed = self
            .conn
            .execute(
                "UPDATE file_list
                 SET status = ?1, password_found = ?2, error = ?3, completed_at = ?4, total_time_minutes = ?5
                 WHERE id = ?6 AND status IN ('PENDING', 'IN_PROGRESS')",
                params![
                    outcome.file_status().as_db_str(),
                    outcome.as_record_str(),
                    error,
                    self.now_ms(),
                    duration.as_secs_f64() / 60.0,
                    file_id
                ],
            )
            .context("record file result")?;
        Ok(changed == 1)
    }

    fn get_by_fingerprint(&self, fingerprint: &str) -> Result<Vec<FileTask>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {FILE_COLUMNS} FROM file_list WHERE file_hash = ?1 ORDER BY id"
            ))
            .context("prepare select by hash")?;
        let rows = stmt.query_map([fingerprint], file_from_row)?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(files)
    }

    fn get(&self, file_id: FileId) -> Result<Option<FileTask>> {
        self.conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM file_list WHERE id = ?1"),
                [file_id],
                file_from_row,
            )
            .optional()
            .context("select file by id")
    }

    fn set_passcode_required(&self, file_id: FileId, required: PasscodeRequirement) -> Result<()> {
        self.conn
            .execute(
                "UPDATE file_list SET has_password = ?1 WHERE id = ?2",
                params![required.as_db_int(), file_id],
            )
            .context("update has_password")?;
        Ok(())
    }
}
