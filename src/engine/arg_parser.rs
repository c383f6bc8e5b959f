use clap::Parser;
use std::path::PathBuf;

/// Cooperative numeric-passcode recovery. Every worker pointed at the same store shares the work.
#[derive(Clone, Debug, Parser)]
#[command(name = "brutus")]
#[command(about = "Enqueue documents under PATH, then work the shared queue until it is drained.")]
pub struct Cli {
    /// File or directory of documents to enqueue.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Shared store. Default: `brutus.db` in the current directory (or BRUTUS_DB).
    #[arg(long, short)]
    pub db: Option<PathBuf>,

    /// Result log (tab-separated). Default: `Found.txt`.
    #[arg(long)]
    pub found: Option<PathBuf>,

    /// Minutes after which a checked-out batch is presumed abandoned.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub stale_minutes: Option<u64>,

    /// Workers to run in this process. Each has its own store connection and identity.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Passcode width in digits.
    #[arg(long)]
    pub digits: Option<u32>,

    /// Batches per file. Must divide 10^digits.
    #[arg(long)]
    pub partitions: Option<u32>,

    /// qpdf executable used to test passcodes.
    #[arg(long)]
    pub qpdf: Option<PathBuf>,

    /// Do not scan PATH; only work what is already queued.
    #[arg(long)]
    pub no_scan: bool,

    /// Show a progress bar for the batch being scanned (single worker only).
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
