//! Batch queue over `trial_batches`: idempotent creation, atomic checkout, lease reclaim.

use anyhow::{Context, Result, bail};
use log::debug;
use rusqlite::{OptionalExtension, params};
use std::time::Duration;

use crate::engine::queue::BatchQueue;
use crate::{Batch, BatchId, BatchStatus, FileId, WorkerId};

use super::{BATCH_COLUMNS, SqliteStore, batch_from_row};

const INSERT_BATCH_SQL: &str = "INSERT OR IGNORE INTO trial_batches (file_id, batch_index, range_from, range_to, status)
     VALUES (?1, ?2, ?3, ?4, 'PENDING')";

impl SqliteStore {
    /// All batches of `file_id` in index order.
    pub fn batches_for_file(&self, file_id: FileId) -> Result<Vec<Batch>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {BATCH_COLUMNS} FROM trial_batches WHERE file_id = ?1 ORDER BY batch_index"
            ))
            .context("prepare select batches")?;
        let rows = stmt.query_map([file_id], batch_from_row)?;
        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?);
        }
        Ok(batches)
    }

    pub fn get_batch(&self, batch_id: BatchId) -> Result<Option<Batch>> {
        self.conn
            .query_row(
                &format!("SELECT {BATCH_COLUMNS} FROM trial_batches WHERE id = ?1"),
                [batch_id],
                batch_from_row,
            )
            .optional()
            .context("select batch by id")
    }
}

impl BatchQueue for SqliteStore {
    fn create_batches(&self, file_id: FileId) -> Result<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin transaction")?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_BATCH_SQL).context("prepare insert")?;
            for p in self.space.partition() {
                inserted += stmt
                    .execute(params![file_id, p.index, p.range.from, p.range.to])
                    .context("insert batch")?;
            }
        }
        tx.commit().context("commit transaction")?;
        debug!("file {file_id}: {inserted} batches created");
        Ok(inserted)
    }

    fn checkout_next(&self, file_id: FileId, worker: &WorkerId) -> Result<Option<Batch>> {
        // Select and claim in one statement so two workers never receive the same row.
        let sql = format!(
            "UPDATE trial_batches
             SET status = 'CHECKED_OUT', checked_out_at = ?1, instance_id = ?2
             WHERE id = (
                 SELECT id FROM trial_batches
                 WHERE file_id = ?3 AND status = 'PENDING'
                 ORDER BY batch_index
                 LIMIT 1
             )
             RETURNING {BATCH_COLUMNS}"
        );
        self.conn
            .query_row(
                &sql,
                params![self.now_ms(), worker.as_str(), file_id],
                batch_from_row,
            )
            .optional()
            .context("checkout batch")
    }

    fn complete(&self, batch_id: BatchId, status: BatchStatus) -> Result<()> {
        if !status.is_terminal() {
            bail!("cannot complete batch {batch_id} with non-terminal status {status:?}");
        }
        let changed = self
            .conn
            .execute(
                "UPDATE trial_batches SET status = ?1, completed_at = ?2
                 WHERE id = ?3 AND status != 'COMPLETED'",
                params![status.as_db_str(), self.now_ms(), batch_id],
            )
            .context("complete batch")?;
        if changed == 0 {
            if self.get_batch(batch_id)?.is_none() {
                bail!("no batch with id {batch_id}");
            }
            debug!("batch {batch_id} already completed");
        }
        Ok(())
    }

    fn all_complete(&self, file_id: FileId) -> Result<bool> {
        let open: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM trial_batches WHERE file_id = ?1 AND status != 'COMPLETED'",
                [file_id],
                |row| row.get(0),
            )
            .context("count open batches")?;
        Ok(open == 0)
    }

    fn reclaim_stale(&self, threshold: Duration) -> Result<usize> {
        let cutoff = self.now_ms() - threshold.as_millis() as i64;
        let reclaimed = self
            .conn
            .execute(
                "UPDATE trial_batches SET status = 'PENDING', checked_out_at = NULL, instance_id = NULL
                 WHERE status = 'CHECKED_OUT' AND checked_out_at <= ?1",
                [cutoff],
            )
            .context("reclaim stale batches")?;
        if reclaimed > 0 {
            debug!("reclaimed {reclaimed} stale batches");
        }
        Ok(reclaimed)
    }
}
