//! [`DocumentLock`] backed by the external `qpdf` tool.
//!
//! `qpdf --requires-password [--password=P] FILE` exits with:
//! - `0`: a password (other than the one supplied) is required
//! - `2`: not encrypted, or an error (then stderr is non-empty)
//! - `3`: encrypted but opens without a password, or the supplied password is correct

use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::document::{DocumentError, DocumentLock, Protection};

enum Answer {
    NeedsPassword,
    NotEncrypted,
    Opens,
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct QpdfLock {
    program: PathBuf,
}

impl QpdfLock {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Fail early when the program cannot be run, so a missing tool is a configuration error
    /// rather than every document being reported unreadable.
    pub fn check_available(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("run {} --version", self.program.display()))?;
        if !status.success() {
            bail!("{} --version exited with {}", self.program.display(), status);
        }
        Ok(())
    }

    fn ask(&self, path: &Path, password: Option<&str>) -> Result<Answer, DocumentError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--requires-password");
        if let Some(p) = password {
            cmd.arg(format!("--password={p}"));
        }
        let output = cmd
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Ok(match (output.status.code(), stderr.is_empty()) {
            (Some(0), _) => Answer::NeedsPassword,
            (Some(3), _) => Answer::Opens,
            (Some(2), true) => Answer::NotEncrypted,
            (code, _) => {
                debug!("{}: qpdf exit {:?}: {}", path.display(), code, stderr);
                if stderr.is_empty() {
                    Answer::Failed(format!("qpdf exited with {:?}", code))
                } else {
                    Answer::Failed(stderr)
                }
            }
        })
    }
}

impl DocumentLock for QpdfLock {
    fn requires_passcode(&self, path: &Path) -> Result<Protection, DocumentError> {
        Ok(match self.ask(path, None)? {
            Answer::NeedsPassword => Protection::Protected,
            Answer::NotEncrypted | Answer::Opens => Protection::NotProtected,
            Answer::Failed(reason) => Protection::Unreadable(reason),
        })
    }

    fn test_passcode(&self, path: &Path, candidate: &str) -> Result<bool, DocumentError> {
        match self.ask(path, Some(candidate))? {
            Answer::Opens | Answer::NotEncrypted => Ok(true),
            Answer::NeedsPassword => Ok(false),
            Answer::Failed(reason) => Err(DocumentError::Unreadable {
                path: path.to_path_buf(),
                reason,
            }),
        }
    }
}
