//! Result sink: tab-separated `Found.txt` with one line per finished file.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const FOUND_HEADER: &str = "File_Path\tPassword\tTime_Minutes";

/// Append-only record of (path, passcode or sentinel, minutes).
pub trait ResultSink: Send + Sync {
    fn record(&self, path: &Path, result: &str, duration_minutes: f64) -> Result<()>;
}

/// Format one sink line (no trailing newline). Minutes are rounded to two decimals.
pub fn format_found_line(path: &Path, result: &str, duration_minutes: f64) -> String {
    format!("{}\t{}\t{:.2}", path.display(), result, duration_minutes)
}

pub struct FoundLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FoundLog {
    /// Open the log, writing the header if the file is new or empty.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open result log {}", path.display()))?;
        let is_empty = file
            .metadata()
            .with_context(|| format!("stat result log {}", path.display()))?
            .len()
            == 0;
        if is_empty {
            writeln!(file, "{FOUND_HEADER}").context("write result log header")?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for FoundLog {
    fn record(&self, path: &Path, result: &str, duration_minutes: f64) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow::anyhow!("result log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open result log {}", self.path.display()))?;
        writeln!(file, "{}", format_found_line(path, result, duration_minutes))
            .context("append result line")?;
        Ok(())
    }
}
