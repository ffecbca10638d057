//! Default on-disk locations.

use std::path::PathBuf;

use crate::consts::{APP_NAME, CACHE_DIR_ENV};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").map(PathBuf::from)
}

/// Returns the directory for resolution cache stores.
///
/// Priority order:
/// 1. `DEPCACHE_CACHE_DIR`
/// 2. `%LOCALAPPDATA%\depcache\Cache` (Windows) or `$XDG_CACHE_HOME/depcache`
/// 3. `~/.cache/depcache`
/// 4. `.depcache` relative to the working directory
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
    return PathBuf::from(dir);
  }
  match std::env::var_os("LOCALAPPDATA") {
    Some(local) => PathBuf::from(local).join(APP_NAME).join("Cache"),
    None => fallback_dir(),
  }
}

/// Returns the directory for resolution cache stores.
///
/// Priority order:
/// 1. `DEPCACHE_CACHE_DIR`
/// 2. `$XDG_CACHE_HOME/depcache`
/// 3. `~/.cache/depcache`
/// 4. `.depcache` relative to the working directory
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
    return PathBuf::from(dir);
  }
  if let Some(cache_home) = std::env::var_os("XDG_CACHE_HOME") {
    return PathBuf::from(cache_home).join(APP_NAME);
  }
  match home_dir() {
    Some(home) => home.join(".cache").join(APP_NAME),
    None => fallback_dir(),
  }
}

fn fallback_dir() -> PathBuf {
  PathBuf::from(format!(".{APP_NAME}"))
}
