//! One run: open the store, enqueue what is under the input path, then drive workers until the
//! queue is drained or the run is cancelled.

use anyhow::{Result, anyhow};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;

use crate::Opts;
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::coordinator::{Coordinator, WorkerContext, WorkerExit, WorkerSummary};
use crate::engine::db_ops::{SqliteStore, open_store};
use crate::engine::document::DocumentLock;
use crate::pipeline::{EnqueueSummary, discover_files, enqueue_files};
use crate::types::WorkerId;
use crate::utils::found_log::{FoundLog, ResultSink};
use crate::utils::logger::Reporter;

/// How one worker ended.
#[derive(Clone, Debug)]
pub struct WorkerReport {
    pub worker: WorkerId,
    pub exit: WorkerExit,
    pub summary: WorkerSummary,
}

#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// `None` when scanning was skipped.
    pub enqueue: Option<EnqueueSummary>,
    pub workers: Vec<WorkerReport>,
}

impl RunSummary {
    pub fn passcodes_found(&self) -> usize {
        self.workers.iter().map(|w| w.summary.passcodes_found).sum()
    }

    pub fn cancelled(&self) -> bool {
        self.workers.iter().any(|w| w.exit == WorkerExit::Cancelled)
    }
}

/// Run against the store at `opts.db_path`. `opts.path` should already be canonical.
pub fn run_path(
    opts: &Opts,
    doc: &dyn DocumentLock,
    reporter: &dyn Reporter,
    cancel: Option<&AtomicBool>,
) -> Result<RunSummary> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(&opts.db_path, opts.space, Arc::clone(&clock))?;
    info!("Database initialized at {}", opts.db_path.display());
    let sink = FoundLog::open(&opts.found_path)?;
    info!("Results are appended to {}", sink.path().display());

    let enqueue = if opts.no_scan {
        None
    } else {
        reporter.info(&format!("Scanning for files in {}", opts.path.display()));
        let discovery = discover_files(&opts.path, &opts.extensions)?;
        for (path, reason) in &discovery.skipped {
            warn!("Skipped {}: {}", path.display(), reason);
        }
        Some(enqueue_files(&store, &discovery.files, &sink, reporter)?)
    };

    let workers = if opts.workers <= 1 {
        vec![run_worker(&store, opts, doc, reporter, &sink, cancel)?]
    } else {
        drop(store);
        thread::scope(|s| {
            let handles: Vec<_> = (0..opts.workers)
                .map(|_| {
                    let clock = Arc::clone(&clock);
                    let sink = &sink;
                    s.spawn(move || {
                        let store = open_store(&opts.db_path, opts.space, clock)?;
                        run_worker(&store, opts, doc, reporter, sink, cancel)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| anyhow!("worker thread panicked"))?)
                .collect::<Result<Vec<_>>>()
        })?
    };

    Ok(RunSummary { enqueue, workers })
}

/// One worker with a fresh identity over `store`.
pub fn run_worker(
    store: &SqliteStore,
    opts: &Opts,
    doc: &dyn DocumentLock,
    reporter: &dyn Reporter,
    sink: &dyn ResultSink,
    cancel: Option<&AtomicBool>,
) -> Result<WorkerReport> {
    let worker = WorkerId::generate();
    reporter.info(&format!("Brutus instance {worker} started."));
    let ctx = WorkerContext {
        worker: worker.clone(),
        doc,
        reporter,
        sink,
        stale_after: opts.stale_after,
        cancel,
    };
    let mut coordinator = Coordinator::new(store, store, ctx);
    let exit = coordinator.run()?;
    Ok(WorkerReport {
        worker,
        exit,
        summary: coordinator.summary().clone(),
    })
}
