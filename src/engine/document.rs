//! Document capability: does a file need a passcode, and does a candidate unlock it.

use std::path::{Path, PathBuf};

/// Answer to "does this document need a passcode?".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Protection {
    NotProtected,
    Protected,
    /// Could not be opened at all (corrupt, truncated, not a document).
    Unreadable(String),
}

/// Failure testing a candidate. A wrong passcode is `Ok(false)`, never an error.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("{path}: unreadable document: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Implemented by whatever actually opens documents. Shared by every worker in the process.
pub trait DocumentLock: Send + Sync {
    /// `Err` only when the check itself could not run; an unreadable document is
    /// `Ok(Protection::Unreadable)`.
    fn requires_passcode(&self, path: &Path) -> Result<Protection, DocumentError>;

    fn test_passcode(&self, path: &Path, candidate: &str) -> Result<bool, DocumentError>;
}
