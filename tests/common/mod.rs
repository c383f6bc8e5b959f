//! Fakes shared by the integration tests.
#![allow(dead_code)]

use brutus::engine::{DocumentError, DocumentLock, Protection};
use brutus::utils::{Reporter, ResultSink};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Document with a fixed protection answer and, optionally, one passcode that opens it.
pub struct FakeDoc {
    pub protection: Protection,
    pub secret: Option<String>,
    /// Candidate at which the document "breaks" and reports itself unreadable.
    pub breaks_at: Option<String>,
    /// The capability itself cannot run (e.g. the tool cannot be spawned).
    pub unavailable: bool,
    pub tested: AtomicU64,
}

impl FakeDoc {
    pub fn locked(secret: &str) -> Self {
        Self {
            protection: Protection::Protected,
            secret: Some(secret.to_string()),
            breaks_at: None,
            unavailable: false,
            tested: AtomicU64::new(0),
        }
    }

    pub fn locked_no_match() -> Self {
        Self {
            protection: Protection::Protected,
            secret: None,
            breaks_at: None,
            unavailable: false,
            tested: AtomicU64::new(0),
        }
    }

    pub fn open() -> Self {
        Self {
            protection: Protection::NotProtected,
            ..Self::locked_no_match()
        }
    }

    pub fn unreadable(reason: &str) -> Self {
        Self {
            protection: Protection::Unreadable(reason.to_string()),
            ..Self::locked_no_match()
        }
    }

    pub fn tested(&self) -> u64 {
        self.tested.load(Ordering::SeqCst)
    }
}

impl DocumentLock for FakeDoc {
    fn requires_passcode(&self, path: &Path) -> Result<Protection, DocumentError> {
        if self.unavailable {
            return Err(DocumentError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from_raw_os_error(24),
            });
        }
        Ok(self.protection.clone())
    }

    fn test_passcode(&self, path: &Path, candidate: &str) -> Result<bool, DocumentError> {
        self.tested.fetch_add(1, Ordering::SeqCst);
        if self.breaks_at.as_deref() == Some(candidate) {
            return Err(DocumentError::Unreadable {
                path: path.to_path_buf(),
                reason: "xref table damaged".to_string(),
            });
        }
        Ok(self.secret.as_deref() == Some(candidate))
    }
}

#[derive(Default)]
pub struct VecSink {
    pub lines: Mutex<Vec<(PathBuf, String, f64)>>,
}

impl VecSink {
    pub fn results(&self) -> Vec<(PathBuf, String)> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(p, r, _)| (p.clone(), r.clone()))
            .collect()
    }
}

impl ResultSink for VecSink {
    fn record(&self, path: &Path, result: &str, duration_minutes: f64) -> anyhow::Result<()> {
        self.lines
            .lock()
            .unwrap()
            .push((path.to_path_buf(), result.to_string(), duration_minutes));
        Ok(())
    }
}

/// Keeps every message so tests can check what a worker said.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
    pub progress_calls: AtomicU64,
}

impl RecordingReporter {
    fn push(&self, kind: &str, msg: &str) {
        self.messages.lock().unwrap().push(format!("{kind}: {msg}"));
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }

    fn success(&self, msg: &str) {
        self.push("success", msg);
    }

    fn skip(&self, msg: &str) {
        self.push("skip", msg);
    }

    fn error(&self, msg: &str) {
        self.push("error", msg);
    }

    fn progress(&self, _batch: &brutus::Batch, _current: &str, _tested: u64) {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
    }
}
