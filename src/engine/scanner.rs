//! Range scanner: test every candidate of one batch, in order, until one unlocks the document.

use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::document::{DocumentError, DocumentLock};
use crate::utils::config::ProgressConsts;
use crate::utils::logger::Reporter;
use crate::{Batch, PasscodeRange};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(String),
    /// Every candidate in the range was wrong.
    Exhausted,
    /// Stopped by the cancel flag before the range was finished.
    Cancelled,
    /// The document could not be read while testing a candidate.
    Unreadable(String),
}

/// Candidates of `range` in ascending numeric order, zero-padded to the range width.
pub fn candidates(range: &PasscodeRange) -> Result<impl Iterator<Item = String>> {
    let (from, to) = range.bounds()?;
    let width = range.width();
    Ok((from..=to).map(move |n| format!("{:0width$}", n, width = width)))
}

pub struct RangeScanner<'a> {
    doc: &'a dyn DocumentLock,
    reporter: &'a dyn Reporter,
    cancel: Option<&'a AtomicBool>,
    cadence: u64,
}

impl<'a> RangeScanner<'a> {
    pub fn new(doc: &'a dyn DocumentLock, reporter: &'a dyn Reporter) -> Self {
        Self {
            doc,
            reporter,
            cancel: None,
            cadence: ProgressConsts::SCAN_CADENCE,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_cadence(mut self, cadence: u64) -> Self {
        self.cadence = cadence.max(1);
        self
    }

    /// Scan `batch.range` against `path`. I/O failures of the capability itself are errors;
    /// an unreadable document is an outcome.
    pub fn scan(&self, path: &Path, batch: &Batch) -> Result<ScanOutcome> {
        self.reporter.batch_started(batch);
        let outcome = self.scan_inner(path, batch);
        self.reporter.batch_finished(batch);
        outcome
    }

    fn scan_inner(&self, path: &Path, batch: &Batch) -> Result<ScanOutcome> {
        for (tested, candidate) in candidates(&batch.range)?.enumerate() {
            if self.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Ok(ScanOutcome::Cancelled);
            }
            let tested = tested as u64;
            if tested % self.cadence == 0 {
                self.reporter.progress(batch, &candidate, tested);
            }
            match self.doc.test_passcode(path, &candidate) {
                Ok(true) => return Ok(ScanOutcome::Found(candidate)),
                Ok(false) => {}
                Err(DocumentError::Unreadable { reason, .. }) => {
                    return Ok(ScanOutcome::Unreadable(reason));
                }
                Err(e @ DocumentError::Io { .. }) => return Err(e.into()),
            }
        }
        Ok(ScanOutcome::Exhausted)
    }
}
