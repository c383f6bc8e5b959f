//! Fingerprint discovered files and add them to the file queue, short-circuiting duplicates.

use anyhow::Result;
use rayon::prelude::*;
use std::path::PathBuf;

use crate::engine::hashing::fingerprint_file;
use crate::engine::queue::FileQueue;
use crate::utils::found_log::ResultSink;
use crate::utils::logger::Reporter;
use crate::{FileStatus, FileTask};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnqueueSummary {
    pub added: usize,
    pub already_queued: usize,
    /// Content already solved under another path; reported, not queued.
    pub duplicates: usize,
    /// Could not be fingerprinted.
    pub unreadable: usize,
}

/// Completed task with the same content under a different path, if any.
pub fn completed_duplicate<'a>(existing: &'a [FileTask], path: &std::path::Path) -> Option<&'a FileTask> {
    existing
        .iter()
        .find(|f| f.status == FileStatus::Completed && f.path != path)
}

/// Hash `paths` in parallel, then add them one by one. A path whose content matches an
/// already Completed task gets that task's result written to `sink` and is never queued.
pub fn enqueue_files<F: FileQueue>(
    queue: &F,
    paths: &[PathBuf],
    sink: &dyn ResultSink,
    reporter: &dyn Reporter,
) -> Result<EnqueueSummary> {
    reporter.info(&format!(
        "Found {} candidate files. Calculating fingerprints...",
        paths.len()
    ));
    let fingerprints: Vec<_> = paths
        .par_iter()
        .map(|p| (p, fingerprint_file(p)))
        .collect();

    let mut summary = EnqueueSummary::default();
    for (path, fingerprint) in fingerprints {
        let fingerprint = match fingerprint {
            Ok(f) => f,
            Err(e) => {
                reporter.error(&format!("{e:#}"));
                summary.unreadable += 1;
                continue;
            }
        };
        let existing = queue.get_by_fingerprint(&fingerprint)?;
        if let Some(done) = completed_duplicate(&existing, path) {
            let result = done
                .outcome
                .as_ref()
                .map(|o| o.as_record_str().to_string())
                .unwrap_or_default();
            reporter.info(&format!(
                "DUPLICATE: File {} already processed as {}, password: {}",
                path.display(),
                done.path.display(),
                result
            ));
            sink.record(path, &result, 0.0)?;
            summary.duplicates += 1;
            continue;
        }
        if queue.add_if_new(path, &fingerprint)? {
            summary.added += 1;
        } else {
            summary.already_queued += 1;
        }
    }
    reporter.info("Finished scanning and adding files.");
    Ok(summary)
}
