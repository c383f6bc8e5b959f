//! Environment overrides: process env first, then a `.env` file in the given dir.

use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn try_env_then_dotenv(key: &str, dir: &Path) -> Option<String> {
    if let Some(s) = non_empty_var(key) {
        return Some(s);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        return non_empty_var(key);
    }
    None
}

/// Store path from `BRUTUS_DB` (env or `.env` in `dir`), if set.
pub fn db_path_from_env(dir: &Path) -> Option<PathBuf> {
    try_env_then_dotenv(&PackagePaths::get().db_env_var(), dir).map(PathBuf::from)
}
