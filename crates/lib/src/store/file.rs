//! File-backed stores.
//!
//! # Storage Layout
//!
//! ```text
//! {cache_dir}/
//! ├── inputs          # last fingerprint + raw inputs
//! └── output          # last update report + file stamps
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{CacheStore, CacheStoreFactory, StoreError};
use crate::paths::cache_dir;

/// A single entry stored in one file.
#[derive(Debug)]
pub struct FileStore {
  path: PathBuf,
  key: String,
  open: bool,
}

impl FileStore {
  pub fn new(path: PathBuf) -> Self {
    let key = path.display().to_string();
    Self { path, key, open: true }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn ensure_open(&self) -> Result<(), StoreError> {
    if self.open {
      Ok(())
    } else {
      Err(StoreError::Closed { key: self.key.clone() })
    }
  }

  fn temp_path(&self) -> PathBuf {
    let mut name = self
      .path
      .file_name()
      .map(|n| n.to_os_string())
      .unwrap_or_default();
    name.push(".tmp");
    self.path.with_file_name(name)
  }
}

impl CacheStore for FileStore {
  fn key(&self) -> &str {
    &self.key
  }

  fn exists(&self) -> bool {
    self.path.is_file()
  }

  fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
    self.ensure_open()?;
    match fs::read(&self.path) {
      Ok(bytes) => {
        trace!(path = %self.path.display(), len = bytes.len(), "read store entry");
        Ok(Some(bytes))
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(StoreError::read_failed(&self.key, e)),
    }
  }

  /// Writes atomically (write to temp, then rename).
  fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
    self.ensure_open()?;
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(|e| StoreError::write_failed(&self.key, e))?;
    }

    let temp_path = self.temp_path();
    fs::write(&temp_path, bytes).map_err(|e| StoreError::write_failed(&self.key, e))?;
    if let Err(e) = fs::rename(&temp_path, &self.path) {
      let _ = fs::remove_file(&temp_path);
      return Err(StoreError::write_failed(&self.key, e));
    }
    debug!(path = %self.path.display(), len = bytes.len(), "wrote store entry");
    Ok(())
  }

  fn close(&mut self) {
    if self.open {
      self.open = false;
      trace!(path = %self.path.display(), "closed store");
    }
  }
}

/// Hands out one [`FileStore`] per key under a base directory.
#[derive(Debug, Clone)]
pub struct DirectoryStoreFactory {
  base: PathBuf,
}

impl DirectoryStoreFactory {
  pub fn new(base: PathBuf) -> Self {
    Self { base }
  }

  /// Factory rooted at the default cache directory.
  pub fn default_location() -> Self {
    Self::new(cache_dir())
  }

  pub fn base(&self) -> &Path {
    &self.base
  }
}

impl CacheStoreFactory for DirectoryStoreFactory {
  fn make(&self, key: &str) -> Box<dyn CacheStore> {
    Box::new(FileStore::new(self.base.join(key)))
  }

  fn sub(&self, key: &str) -> Box<dyn CacheStoreFactory> {
    Box::new(Self::new(self.base.join(key)))
  }
}
