//! CLI command handler: build options, check the environment, run workers.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::partition::SearchSpace;
use crate::engine::progress::BarReporter;
use crate::engine::qpdf::QpdfLock;
use crate::engine::tools::canonicalize_input;
use crate::run::{RunSummary, run_path};
use crate::utils::brutus_toml::{apply_file_to_opts, load_brutus_toml};
use crate::utils::{LogReporter, Reporter, db_path_from_env, setup_logging};

/// Defaults → `.brutus.toml` in `config_dir` → `BRUTUS_DB` → CLI flags.
pub fn build_opts(cli: &Cli, config_dir: &Path) -> Result<Opts> {
    let mut opts = Opts::default();
    let (mut digits, mut partitions) = (None, None);
    if let Some(file) = load_brutus_toml(config_dir) {
        (digits, partitions) = apply_file_to_opts(&file, &mut opts);
    }
    if let Some(db) = db_path_from_env(config_dir) {
        opts.db_path = db;
    }

    opts.path = cli.path.clone();
    if let Some(ref db) = cli.db {
        opts.db_path = db.clone();
    }
    if let Some(ref found) = cli.found {
        opts.found_path = found.clone();
    }
    if let Some(mins) = cli.stale_minutes {
        opts.stale_after = Duration::from_secs(mins * 60);
    }
    if let Some(n) = cli.workers {
        opts.workers = n as usize;
    }
    if let Some(ref q) = cli.qpdf {
        opts.qpdf = q.clone();
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    if let Some(p) = cli.progress {
        opts.progress = p;
    }
    opts.no_scan = cli.no_scan;

    opts.space = SearchSpace::new(
        cli.digits.or(digits).unwrap_or(opts.space.digits),
        cli.partitions.or(partitions).unwrap_or(opts.space.partitions),
    )?;
    opts.workers = opts.workers.max(1);
    Ok(opts)
}

/// Run one CLI invocation. Configuration errors return before the store is touched.
pub fn handle_run(cli: &Cli) -> Result<RunSummary> {
    let cwd = std::env::current_dir().context("read current directory")?;
    let mut opts = build_opts(cli, &cwd)?;
    setup_logging(opts.verbose);
    opts.path = canonicalize_input(&opts.path)?;
    debug!("{} CONFIG: {:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);

    let doc = QpdfLock::new(&opts.qpdf);
    doc.check_available()
        .context("the qpdf tool is required to test passcodes (see --qpdf)")?;

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_handler = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        cancel_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    if opts.progress && opts.workers > 1 {
        warn!("--progress is ignored with more than one worker");
    }
    let reporter: Box<dyn Reporter> = if opts.progress && opts.workers == 1 {
        Box::new(BarReporter::new(LogReporter))
    } else {
        Box::new(LogReporter)
    };

    let summary = run_path(&opts, &doc, reporter.as_ref(), Some(&cancel))?;
    if cancel.load(Ordering::Relaxed) {
        warn!("Cancelled by user; leases held by this run expire after the stale threshold");
    }
    Ok(summary)
}
