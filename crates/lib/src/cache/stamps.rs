//! File modification stamps.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Recorded stamps, milliseconds since the epoch, keyed by path.
pub type Stamps = BTreeMap<PathBuf, u64>;

/// Modification time of `path` in milliseconds, or `None` if it is missing.
pub fn modified_millis(path: &Path) -> Option<u64> {
  let modified = fs::metadata(path).ok()?.modified().ok()?;
  let millis = modified.duration_since(UNIX_EPOCH).ok()?.as_millis();
  u64::try_from(millis).ok()
}

/// Stamp every existing file in `files`. Missing files are left out.
pub fn stamp_files<'a>(files: impl IntoIterator<Item = &'a Path>) -> Stamps {
  files
    .into_iter()
    .filter_map(|path| modified_millis(path).map(|stamp| (path.to_path_buf(), stamp)))
    .collect()
}

/// Whether `path` still carries the stamp recorded for it.
///
/// A missing file, or one with no recorded stamp, is not up to date.
pub fn is_up_to_date(path: &Path, recorded: &Stamps) -> bool {
  match (recorded.get(path), modified_millis(path)) {
    (Some(expected), Some(actual)) => *expected == actual,
    _ => false,
  }
}
