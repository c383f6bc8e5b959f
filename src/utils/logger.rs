use colored::Colorize;
use env_logger::Builder;
use log::Level;
use std::io::Write;

use crate::Batch;

pub fn setup_logging(verbose: bool) {
    use log::LevelFilter;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // try_init: several entry points (and tests) may call this in one process.
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(env!("CARGO_PKG_NAME"), level) // Our crate: use requested level
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!("[{} {} {}] {}", name.cyan(), level_str, path, record.args())
                }
                _ => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}

/// Human-facing progress sink. Injected into the worker, scanner and discovery; nothing here
/// affects queue state.
pub trait Reporter: Send + Sync {
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn skip(&self, msg: &str);
    fn error(&self, msg: &str);

    fn batch_started(&self, _batch: &Batch) {}

    /// Called by the scanner every [`ProgressConsts::SCAN_CADENCE`](crate::utils::config::ProgressConsts) candidates.
    fn progress(&self, batch: &Batch, current: &str, _tested: u64) {
        self.info(&format!(
            "Testing range {}, current: {}",
            batch.range, current
        ));
    }

    fn batch_finished(&self, _batch: &Batch) {}
}

/// [`Reporter`] on top of the `log` facade. Scan progress goes to debug.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, msg: &str) {
        log::info!("{msg}");
    }

    fn success(&self, msg: &str) {
        log::info!("{} {}", "SUCCESS".green().bold(), msg);
    }

    fn skip(&self, msg: &str) {
        log::info!("{} {}", "SKIP".yellow(), msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{msg}");
    }

    fn progress(&self, batch: &Batch, current: &str, tested: u64) {
        log::debug!(
            "Batch {} ({}): {} tested, current {}",
            batch.index,
            batch.range,
            tested,
            current
        );
    }
}
