//! Public and internal types for the brutus work queue and worker loop.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::partition::SearchSpace;
use crate::utils::config::{LeaseConsts, PackagePaths, SearchConsts};

/// Row id of a [`FileTask`].
pub type FileId = i64;

/// Row id of a [`Batch`].
pub type BatchId = i64;

/// Advisory owner tag written onto leases. Fresh per worker run; carries no authority.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkerId(String);

impl WorkerId {
    /// New random identity (uuid v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing state of a [`FileTask`]. Stored as the `status` column of `file_list`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    Pending,
    InProgress,
    Completed,
    /// Terminal state for documents the capability could not read.
    Failed,
}

impl FileStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "PENDING",
            FileStatus::InProgress => "IN_PROGRESS",
            FileStatus::Completed => "COMPLETED",
            FileStatus::Failed => "FAILED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(FileStatus::Pending),
            "IN_PROGRESS" => Some(FileStatus::InProgress),
            "COMPLETED" => Some(FileStatus::Completed),
            "FAILED" => Some(FileStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Failed)
    }
}

/// Lease state of a [`Batch`]. Stored as the `status` column of `trial_batches`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    Pending,
    CheckedOut,
    Completed,
}

impl BatchStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "PENDING",
            BatchStatus::CheckedOut => "CHECKED_OUT",
            BatchStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BatchStatus::Pending),
            "CHECKED_OUT" => Some(BatchStatus::CheckedOut),
            "COMPLETED" => Some(BatchStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed)
    }
}

/// Tri-state `has_password` column: 0 = unknown, 1 = yes, 2 = no.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PasscodeRequirement {
    #[default]
    Unknown,
    Required,
    NotRequired,
}

impl PasscodeRequirement {
    pub fn as_db_int(&self) -> i64 {
        match self {
            PasscodeRequirement::Unknown => 0,
            PasscodeRequirement::Required => 1,
            PasscodeRequirement::NotRequired => 2,
        }
    }

    pub fn from_db_int(v: i64) -> Self {
        match v {
            1 => PasscodeRequirement::Required,
            2 => PasscodeRequirement::NotRequired,
            _ => PasscodeRequirement::Unknown,
        }
    }
}

/// Final result recorded on a [`FileTask`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The passcode that unlocked the document.
    Found(String),
    /// The document opens without a passcode.
    NoPasscodeNeeded,
    /// Every batch was scanned without success.
    Exhausted,
    /// The capability could not read the document at all.
    Unreadable(String),
}

impl Outcome {
    pub const NO_PASSWORD: &'static str = "NO_PASSWORD";
    pub const EXHAUSTED: &'static str = "FAILED";
    pub const UNREADABLE: &'static str = "UNREADABLE";

    /// Value written to `password_found` and to the result sink.
    pub fn as_record_str(&self) -> &str {
        match self {
            Outcome::Found(p) => p,
            Outcome::NoPasscodeNeeded => Self::NO_PASSWORD,
            Outcome::Exhausted => Self::EXHAUSTED,
            Outcome::Unreadable(_) => Self::UNREADABLE,
        }
    }

    /// Status a file moves to when this outcome is recorded.
    pub fn file_status(&self) -> FileStatus {
        match self {
            Outcome::Unreadable(_) => FileStatus::Failed,
            _ => FileStatus::Completed,
        }
    }

    /// Rebuild from stored columns. `error` carries the unreadable reason.
    pub fn from_record(password_found: &str, error: Option<String>) -> Self {
        match password_found {
            Self::NO_PASSWORD => Outcome::NoPasscodeNeeded,
            Self::EXHAUSTED => Outcome::Exhausted,
            Self::UNREADABLE => Outcome::Unreadable(error.unwrap_or_default()),
            p => Outcome::Found(p.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_record_str())
    }
}

/// One row of `file_list`: a distinct document path and its processing state.
#[derive(Clone, Debug)]
pub struct FileTask {
    pub id: FileId,
    pub path: PathBuf,
    /// Content fingerprint (hex blake3).
    pub fingerprint: String,
    pub status: FileStatus,
    pub passcode_required: PasscodeRequirement,
    /// Set only once the task is terminal.
    pub outcome: Option<Outcome>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<f64>,
    pub owner: Option<String>,
}

/// Inclusive range of fixed-width decimal candidates, e.g. `"010000"..="019999"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasscodeRange {
    pub from: String,
    pub to: String,
}

impl PasscodeRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Digit count of each candidate (leading zeros are significant).
    pub fn width(&self) -> usize {
        self.from.len()
    }

    /// Numeric bounds. Fails when either end is not a plain decimal string.
    pub fn bounds(&self) -> anyhow::Result<(u64, u64)> {
        let from = parse_digits(&self.from)?;
        let to = parse_digits(&self.to)?;
        if from > to {
            anyhow::bail!("range start {} is after range end {}", self.from, self.to);
        }
        Ok((from, to))
    }

    /// Number of candidates in the range (0 if the range is malformed).
    pub fn len(&self) -> u64 {
        self.bounds().map(|(a, b)| b - a + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for PasscodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

fn parse_digits(s: &str) -> anyhow::Result<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        anyhow::bail!("not a fixed-width decimal candidate: {s:?}");
    }
    Ok(s.parse()?)
}

/// One row of `trial_batches`: a leased slice of the passcode space for one file.
#[derive(Clone, Debug)]
pub struct Batch {
    pub id: BatchId,
    pub file_id: FileId,
    pub index: u32,
    pub range: PasscodeRange,
    pub status: BatchStatus,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub owner: Option<String>,
}

/// Full options (CLI, `.brutus.toml`, env). Built by [`crate::engine::cli`].
#[derive(Clone, Debug)]
pub struct Opts {
    /// File or directory to enqueue before working.
    pub path: PathBuf,
    /// Shared SQLite store.
    pub db_path: PathBuf,
    /// Append-only result sink (tab-separated).
    pub found_path: PathBuf,
    /// Checked-out batches older than this go back to Pending.
    pub stale_after: Duration,
    pub space: SearchSpace,
    /// Extensions (without dot, case-insensitive) picked up by discovery.
    pub extensions: Vec<String>,
    /// Program used by the qpdf document capability.
    pub qpdf: PathBuf,
    /// Workers to run in this process (each with its own connection and id).
    pub workers: usize,
    pub verbose: bool,
    /// Show a progress bar for the batch being scanned.
    pub progress: bool,
    /// Skip discovery; only work the existing queue.
    pub no_scan: bool,
}

impl Default for Opts {
    fn default() -> Self {
        let paths = PackagePaths::get();
        Self {
            path: PathBuf::from("."),
            db_path: PathBuf::from(paths.db_filename()),
            found_path: PathBuf::from(paths.found_filename()),
            stale_after: LeaseConsts::STALE_AFTER,
            space: SearchSpace {
                digits: SearchConsts::DIGITS,
                partitions: SearchConsts::PARTITIONS,
            },
            extensions: vec![SearchConsts::DEFAULT_EXTENSION.to_string()],
            qpdf: PathBuf::from(SearchConsts::QPDF_PROGRAM),
            workers: 1,
            verbose: false,
            progress: false,
            no_scan: false,
        }
    }
}
