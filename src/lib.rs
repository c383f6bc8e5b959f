//! Brutus: cooperative recovery of numeric document passcodes over a shared SQLite queue.
//!
//! Any number of workers (threads or separate processes) point at the same store. Each file's
//! passcode space is split into batches; workers lease batches, scan them, and write results.
//! Leases left behind by a crashed worker return to the queue after the stale threshold.

pub mod engine;
pub mod pipeline;
pub mod run;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{BatchQueue, FileQueue, SqliteStore};
pub use run::{RunSummary, WorkerReport, run_path, run_worker};

/// Result alias used by the public brutus API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
