//! Intake pipeline: discover candidate files, fingerprint, enqueue.

pub mod discover;
pub mod enqueue;

pub use discover::{Discovery, discover_files};
pub use enqueue::{EnqueueSummary, completed_duplicate, enqueue_files};
