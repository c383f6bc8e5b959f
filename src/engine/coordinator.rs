//! Per-worker state machine over the file and batch queues.
//!
//! ```text
//! SelectingFile -> PreparingBatches -> SelectingBatch -> Scanning -> (SelectingBatch | SelectingFile) -> Done
//! ```
//!
//! Stale leases are reclaimed at the top of every `SelectingFile` step, before the next file is
//! chosen. A file whose batches are all held by dead workers is only visible to
//! [`FileQueue::next_to_process`] after that reclaim, so the order matters.

use anyhow::Result;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::engine::document::{DocumentLock, Protection};
use crate::engine::queue::{BatchQueue, FileQueue};
use crate::engine::scanner::{RangeScanner, ScanOutcome};
use crate::utils::found_log::ResultSink;
use crate::utils::logger::Reporter;
use crate::{Batch, BatchStatus, FileStatus, FileTask, Outcome, PasscodeRequirement, WorkerId};

/// Collaborators and settings for one worker.
pub struct WorkerContext<'a> {
    pub worker: WorkerId,
    pub doc: &'a dyn DocumentLock,
    pub reporter: &'a dyn Reporter,
    pub sink: &'a dyn ResultSink,
    pub stale_after: Duration,
    pub cancel: Option<&'a AtomicBool>,
}

/// The file a worker is currently on, and when it started on it.
#[derive(Debug)]
pub struct FileWork {
    pub task: FileTask,
    pub started: Instant,
}

#[derive(Debug)]
pub enum WorkerState {
    SelectingFile,
    PreparingBatches(FileWork),
    SelectingBatch(FileWork),
    Scanning(FileWork, Batch),
    Done(WorkerExit),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// Nothing Pending and nothing resumable: the queue is drained for this worker.
    NoWork,
    /// Stopped by the cancel flag. Any held lease expires on its own.
    Cancelled,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    /// Files this worker moved to a terminal status.
    pub files_finished: usize,
    pub batches_scanned: usize,
    pub passcodes_found: usize,
}

pub struct Coordinator<'a, F: FileQueue, B: BatchQueue> {
    files: &'a F,
    batches: &'a B,
    ctx: WorkerContext<'a>,
    summary: WorkerSummary,
}

impl<'a, F: FileQueue, B: BatchQueue> Coordinator<'a, F, B> {
    pub fn new(files: &'a F, batches: &'a B, ctx: WorkerContext<'a>) -> Self {
        Self {
            files,
            batches,
            ctx,
            summary: WorkerSummary::default(),
        }
    }

    pub fn worker(&self) -> &WorkerId {
        &self.ctx.worker
    }

    pub fn summary(&self) -> &WorkerSummary {
        &self.summary
    }

    /// Drive the state machine until `Done`.
    pub fn run(&mut self) -> Result<WorkerExit> {
        let mut state = WorkerState::SelectingFile;
        loop {
            state = self.step(state)?;
            if let WorkerState::Done(exit) = state {
                return Ok(exit);
            }
        }
    }

    /// Advance one transition. Store errors propagate; the caller decides whether to stop.
    pub fn step(&mut self, state: WorkerState) -> Result<WorkerState> {
        match state {
            WorkerState::SelectingFile => self.select_file(),
            WorkerState::PreparingBatches(work) => self.prepare_batches(work),
            WorkerState::SelectingBatch(work) => self.select_batch(work),
            WorkerState::Scanning(work, batch) => self.scan(work, batch),
            done @ WorkerState::Done(_) => Ok(done),
        }
    }

    fn cancelled(&self) -> bool {
        self.ctx.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
    }

    fn select_file(&mut self) -> Result<WorkerState> {
        if self.cancelled() {
            return Ok(WorkerState::Done(WorkerExit::Cancelled));
        }
        self.batches.reclaim_stale(self.ctx.stale_after)?;
        let Some(task) = self.files.next_to_process()? else {
            self.ctx
                .reporter
                .info("No more pending files available. Worker shutting down.");
            return Ok(WorkerState::Done(WorkerExit::NoWork));
        };
        self.ctx.reporter.info(&format!(
            "--- Assigned File [ID: {}]: {} ---",
            task.id,
            task.path.display()
        ));
        let work = FileWork {
            task,
            started: Instant::now(),
        };

        if work.task.status == FileStatus::InProgress {
            // Resumed via the InProgress fallback: batches already exist.
            return Ok(WorkerState::SelectingBatch(work));
        }

        // Failing to run the capability is an error, not an answer about the document.
        match self.ctx.doc.requires_passcode(&work.task.path)? {
            Protection::Protected => {
                self.files
                    .set_passcode_required(work.task.id, PasscodeRequirement::Required)?;
                self.ctx
                    .reporter
                    .info("File is password protected. Preparing batches.");
                Ok(WorkerState::PreparingBatches(work))
            }
            Protection::NotProtected => {
                self.files
                    .set_passcode_required(work.task.id, PasscodeRequirement::NotRequired)?;
                self.ctx.reporter.skip("File is not password protected.");
                self.finish_file(&work, Outcome::NoPasscodeNeeded)?;
                Ok(WorkerState::SelectingFile)
            }
            Protection::Unreadable(reason) => {
                self.ctx.reporter.error(&format!(
                    "Cannot read {}: {}",
                    work.task.path.display(),
                    reason
                ));
                self.finish_file(&work, Outcome::Unreadable(reason))?;
                Ok(WorkerState::SelectingFile)
            }
        }
    }

    fn prepare_batches(&mut self, work: FileWork) -> Result<WorkerState> {
        self.files.mark_in_progress(work.task.id, &self.ctx.worker)?;
        let created = self.batches.create_batches(work.task.id)?;
        debug!(
            "worker {}: file {} has {} new batches",
            self.ctx.worker, work.task.id, created
        );
        Ok(WorkerState::SelectingBatch(work))
    }

    fn select_batch(&mut self, work: FileWork) -> Result<WorkerState> {
        if self.cancelled() {
            return Ok(WorkerState::Done(WorkerExit::Cancelled));
        }
        if let Some(current) = self.files.get(work.task.id)?
            && current.status.is_terminal()
        {
            self.ctx.reporter.info(&format!(
                "File {} was finished by another worker.",
                work.task.id
            ));
            return Ok(WorkerState::SelectingFile);
        }
        match self.batches.checkout_next(work.task.id, &self.ctx.worker)? {
            Some(batch) => Ok(WorkerState::Scanning(work, batch)),
            None => {
                if self.batches.all_complete(work.task.id)? {
                    self.ctx.reporter.info(&format!(
                        "All batches for file {} scanned without a match.",
                        work.task.id
                    ));
                    self.finish_file(&work, Outcome::Exhausted)?;
                } else {
                    self.ctx.reporter.info(&format!(
                        "No more available batches for file {}. Moving to next file.",
                        work.task.id
                    ));
                }
                Ok(WorkerState::SelectingFile)
            }
        }
    }

    fn scan(&mut self, work: FileWork, batch: Batch) -> Result<WorkerState> {
        self.ctx.reporter.info(&format!(
            "Processing Batch {} ({} - {}) for file {}",
            batch.index, batch.range.from, batch.range.to, work.task.id
        ));
        let mut scanner = RangeScanner::new(self.ctx.doc, self.ctx.reporter);
        if let Some(cancel) = self.ctx.cancel {
            scanner = scanner.with_cancel(cancel);
        }
        match scanner.scan(&work.task.path, &batch)? {
            // Result before batch: until the batch is Completed, no other worker can see
            // AllComplete and record the file as exhausted.
            ScanOutcome::Found(passcode) => {
                self.ctx
                    .reporter
                    .success(&format!("Password FOUND: {passcode}"));
                self.finish_file(&work, Outcome::Found(passcode))?;
                self.batches.complete(batch.id, BatchStatus::Completed)?;
                self.summary.batches_scanned += 1;
                Ok(WorkerState::SelectingFile)
            }
            ScanOutcome::Exhausted => {
                self.batches.complete(batch.id, BatchStatus::Completed)?;
                self.summary.batches_scanned += 1;
                self.ctx
                    .reporter
                    .info(&format!("Password not in batch {}.", batch.index));
                Ok(WorkerState::SelectingBatch(work))
            }
            ScanOutcome::Unreadable(reason) => {
                self.ctx.reporter.error(&format!(
                    "Document became unreadable during batch {}: {}",
                    batch.index, reason
                ));
                self.finish_file(&work, Outcome::Unreadable(reason))?;
                self.batches.complete(batch.id, BatchStatus::Completed)?;
                Ok(WorkerState::SelectingFile)
            }
            ScanOutcome::Cancelled => {
                self.ctx.reporter.info(&format!(
                    "Stopped during batch {}; its lease returns to the queue after {} minutes.",
                    batch.index,
                    self.ctx.stale_after.as_secs() / 60
                ));
                Ok(WorkerState::Done(WorkerExit::Cancelled))
            }
        }
    }

    /// Record the terminal outcome. Only the first worker to finish a file writes the result line.
    fn finish_file(&mut self, work: &FileWork, outcome: Outcome) -> Result<()> {
        let elapsed = work.started.elapsed();
        if !self.files.record_result(work.task.id, &outcome, elapsed)? {
            debug!(
                "file {} already terminal; {} not recorded",
                work.task.id, outcome
            );
            return Ok(());
        }
        self.ctx.sink.record(
            &work.task.path,
            outcome.as_record_str(),
            elapsed.as_secs_f64() / 60.0,
        )?;
        self.summary.files_finished += 1;
        if matches!(outcome, Outcome::Found(_)) {
            self.summary.passcodes_found += 1;
        }
        Ok(())
    }
}
