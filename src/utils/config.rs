//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived paths: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    db_filename: String,
    found_filename: String,
    settings_filename: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache paths from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                db_filename: format!("{pkg}.db"),
                found_filename: "Found.txt".to_string(),
                settings_filename: format!(".{pkg}.toml"),
                env_prefix: pkg.to_uppercase(),
            }
        })
    }

    pub fn db_filename(&self) -> &str {
        &self.db_filename
    }

    pub fn found_filename(&self) -> &str {
        &self.found_filename
    }

    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Env var holding the store path (e.g. `BRUTUS_DB`).
    pub fn db_env_var(&self) -> String {
        format!("{}_DB", self.env_prefix)
    }
}

// ---- Search space ----

/// Default passcode space and discovery settings.
pub struct SearchConsts;

impl SearchConsts {
    /// Candidate width: 6 digits → 000000..999999.
    pub const DIGITS: u32 = 6;
    /// Batches per file. Must divide 10^DIGITS.
    pub const PARTITIONS: u32 = 100;
    pub const DEFAULT_EXTENSION: &'static str = "pdf";
    pub const QPDF_PROGRAM: &'static str = "qpdf";
}

// ---- Leases ----

pub struct LeaseConsts;

impl LeaseConsts {
    /// Checked-out batches older than this are presumed abandoned.
    pub const STALE_AFTER: Duration = Duration::from_secs(10 * 60);
}

// ---- Progress ----

/// Scanner progress cadence.
pub struct ProgressConsts;

impl ProgressConsts {
    /// Emit a progress signal every N candidates.
    pub const SCAN_CADENCE: u64 = 1000;
}

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}

// ---- Database ----

/// How long a connection waits on a locked store before failing the statement.
pub const DB_BUSY_TIMEOUT: Duration = Duration::from_secs(30);
