//! Engine: queue store, leases, scanning and the per-worker state machine.

pub mod arg_parser;
pub mod cli;
pub mod clock;
pub mod coordinator;
pub mod db_ops;
pub mod document;
pub mod hashing;
pub mod partition;
pub mod progress;
pub mod qpdf;
pub mod queue;
pub mod scanner;
pub mod tools;

pub use arg_parser::Cli;
pub use cli::{build_opts, handle_run};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{Coordinator, WorkerContext, WorkerExit, WorkerState, WorkerSummary};
pub use db_ops::{SqliteStore, open_db, open_db_in_memory, open_store, open_store_in_memory};
pub use document::{DocumentError, DocumentLock, Protection};
pub use hashing::{fingerprint_bytes, fingerprint_file};
pub use partition::{Partition, SearchSpace};
pub use qpdf::QpdfLock;
pub use queue::{BatchQueue, FileQueue};
pub use scanner::{RangeScanner, ScanOutcome, candidates};
