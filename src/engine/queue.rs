//! Capability interfaces over the shared store. Any engine that implements both can back a worker.

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use crate::{Batch, BatchId, BatchStatus, FileId, FileTask, Outcome, PasscodeRequirement, WorkerId};

/// Per-file processing state.
pub trait FileQueue {
    /// Insert `path` as Pending. Returns false (and changes nothing) if the path is already known.
    fn add_if_new(&self, path: &Path, fingerprint: &str) -> Result<bool>;

    /// Lowest-id Pending file, else lowest-id InProgress file with at least one Pending batch.
    /// `None` means there is nothing left for this worker to do.
    fn next_to_process(&self) -> Result<Option<FileTask>>;

    /// Pending → InProgress and stamp start time. Calling it on an InProgress file is harmless.
    fn mark_in_progress(&self, file_id: FileId, worker: &WorkerId) -> Result<()>;

    /// Move the file to its terminal status with `outcome`. Only the first call for a file wins;
    /// returns whether this call made the transition.
    fn record_result(&self, file_id: FileId, outcome: &Outcome, duration: Duration) -> Result<bool>;

    /// Every file sharing `fingerprint`, in id order.
    fn get_by_fingerprint(&self, fingerprint: &str) -> Result<Vec<FileTask>>;

    fn get(&self, file_id: FileId) -> Result<Option<FileTask>>;

    fn set_passcode_required(&self, file_id: FileId, required: PasscodeRequirement) -> Result<()>;
}

/// Per-file leased sub-ranges.
pub trait BatchQueue {
    /// Create every partition as a Pending batch. Existing (file, index) rows are left untouched.
    /// Returns the number of rows actually inserted.
    fn create_batches(&self, file_id: FileId) -> Result<usize>;

    /// Atomically claim the lowest-index Pending batch of `file_id`.
    fn checkout_next(&self, file_id: FileId, worker: &WorkerId) -> Result<Option<Batch>>;

    /// Move a batch to a terminal status. Completing an already terminal batch is a no-op.
    fn complete(&self, batch_id: BatchId, status: BatchStatus) -> Result<()>;

    /// True when every batch of `file_id` is Completed.
    fn all_complete(&self, file_id: FileId) -> Result<bool>;

    /// Return CheckedOut batches whose lease is at least `threshold` old to Pending.
    /// Returns the number of batches reclaimed.
    fn reclaim_stale(&self, threshold: Duration) -> Result<usize>;
}
