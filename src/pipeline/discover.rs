//! Find candidate documents under a file or directory.

use anyhow::{Result, bail};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::tools::{has_extension, is_os_hidden_file};

/// Paths found by [`discover_files`] plus entries the walk could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
}

/// A single file is taken if its extension matches; a directory is walked recursively
/// in file-name order. Unreadable directory entries are skipped and reported, not fatal.
pub fn discover_files(root: &Path, extensions: &[String]) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    if root.is_file() {
        if has_extension(root, extensions) {
            discovery.files.push(root.to_path_buf());
        }
        return Ok(discovery);
    }
    if !root.is_dir() {
        bail!("The specified path does not exist: {}", root.display());
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file()
                    && !is_os_hidden_file(path)
                    && has_extension(path, extensions)
                {
                    discovery.files.push(entry.into_path());
                }
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| root.to_path_buf());
                debug!("skipped {}: {}", path.display(), err);
                discovery.skipped.push((path, err.to_string()));
            }
        }
    }
    Ok(discovery)
}
