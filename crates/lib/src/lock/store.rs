//! Typed access to the lock file.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::LockError;
use super::types::LockFileContent;
use crate::consts::LOCK_FORMAT_VERSION;
use crate::log::Logger;
use crate::resolution::ResolutionInput;
use crate::resolution::fingerprint::fingerprint;
use crate::store::{CacheStore, FileStore, read_value, write_value};
use crate::util::hash::Fingerprint;

/// Reads and writes [`LockFileContent`] through a persistent store.
///
/// Owns the underlying store and closes it when dropped, so every exit
/// path releases it.
pub struct LockFileStore {
  store: Box<dyn CacheStore>,
}

impl LockFileStore {
  pub fn open(store: Box<dyn CacheStore>) -> Self {
    Self { store }
  }

  /// Lock file stored at `path`.
  pub fn at_path(path: PathBuf) -> Self {
    Self::open(Box::new(FileStore::new(path)))
  }

  /// Key of the underlying store, e.g. the lock file path.
  pub fn key(&self) -> &str {
    self.store.key()
  }

  pub fn exists(&self) -> bool {
    self.store.exists()
  }

  /// Read the lock file.
  ///
  /// Returns `None` on an empty store, unreadable or corrupt bytes, or an
  /// unsupported format version. Never fails.
  pub fn read(&self) -> Option<LockFileContent> {
    match read_value::<LockFileContent>(self.store.as_ref()) {
      Ok(Some(content)) if content.version == LOCK_FORMAT_VERSION => Some(content),
      Ok(Some(content)) => {
        debug!(
          key = self.store.key(),
          version = %content.version,
          "ignoring lock file with unsupported version"
        );
        None
      }
      Ok(None) => None,
      Err(e) => {
        warn!(key = self.store.key(), error = %e, "ignoring unreadable lock file");
        None
      }
    }
  }

  /// Overwrite the lock file.
  pub fn write(&self, content: &LockFileContent) -> Result<(), LockError> {
    write_value(self.store.as_ref(), content)?;
    Ok(())
  }

  /// Read the lock file and keep it only if it was produced from `hash`.
  pub fn get_matching(&self, hash: &Fingerprint) -> Option<LockFileContent> {
    let content = self.read()?;
    if content.hash == *hash {
      Some(content)
    } else {
      debug!(stored = %content.hash, current = %hash, "lock file is stale");
      None
    }
  }

  /// Read the lock file and keep it only if its hash matches the
  /// fingerprint of `input`.
  ///
  /// # Errors
  ///
  /// Fails only when `input` cannot be fingerprinted.
  pub fn get_up_to_date(&self, input: &ResolutionInput, log: &dyn Logger) -> Result<Option<LockFileContent>, LockError> {
    let hash = fingerprint(input, log)?;
    Ok(self.get_matching(&hash))
  }

  /// Close the underlying store.
  pub fn close(mut self) {
    self.store.close();
  }
}

impl Drop for LockFileStore {
  fn drop(&mut self) {
    self.store.close();
  }
}
