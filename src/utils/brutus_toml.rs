//! Load `.brutus.toml` from a directory (CLI only). Library callers build [`Opts`] themselves.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct BrutusToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    db_path: Option<String>,
    found_path: Option<String>,
    stale_minutes: Option<u64>,
    digits: Option<u32>,
    partitions: Option<u32>,
    extensions: Option<Vec<String>>,
    qpdf: Option<String>,
    workers: Option<usize>,
    verbose: Option<bool>,
    progress: Option<bool>,
}

/// Load the settings file from `dir` if present. Returns None if missing or unparsable.
pub fn load_brutus_toml(dir: &Path) -> Option<BrutusToml> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_brutus_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_brutus_toml(s: &str) -> Result<BrutusToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before env and CLI.
/// `digits`/`partitions` are returned raw so the caller can validate the pair.
pub fn apply_file_to_opts(file: &BrutusToml, opts: &mut Opts) -> (Option<u32>, Option<u32>) {
    let sec = &file.settings;
    if let Some(ref p) = sec.db_path {
        opts.db_path = PathBuf::from(p);
    }
    if let Some(ref p) = sec.found_path {
        opts.found_path = PathBuf::from(p);
    }
    if let Some(mins) = sec.stale_minutes {
        opts.stale_after = Duration::from_secs(mins * 60);
    }
    if let Some(ref v) = sec.extensions {
        opts.extensions = v.clone();
    }
    if let Some(ref q) = sec.qpdf {
        opts.qpdf = PathBuf::from(q);
    }
    apply_file_opt!(sec, opts, workers => workers);
    apply_file_opt!(sec, opts, verbose => verbose);
    apply_file_opt!(sec, opts, progress => progress);
    (sec.digits, sec.partitions)
}
