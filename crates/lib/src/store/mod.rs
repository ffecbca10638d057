//! Opaque persistent key-value stores.
//!
//! A [`CacheStore`] holds one byte blob under one key. A
//! [`CacheStoreFactory`] hands out stores by key; the resolution cache uses
//! two independent slots (`"inputs"` and `"output"`), and the lock file is a
//! single [`FileStore`] at a caller-supplied path.
//!
//! Stores are scoped resources: once [`CacheStore::close`] has run, every
//! further operation fails with [`StoreError::Closed`].
//!
//! # Modules
//!
//! - [`file`] - Stores backed by files, written atomically
//! - [`memory`] - In-process stores sharing state between handles

pub mod file;
pub mod memory;

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::util::canonical::{CanonicalError, from_canonical_slice, to_canonical_vec};

pub use file::{DirectoryStoreFactory, FileStore};
pub use memory::{MemoryStore, MemoryStoreFactory};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
  /// Failed to read the entry.
  #[error("failed to read store entry '{key}': {source}")]
  Read {
    key: String,
    #[source]
    source: io::Error,
  },

  /// Failed to write the entry.
  #[error("failed to write store entry '{key}': {source}")]
  Write {
    key: String,
    #[source]
    source: io::Error,
  },

  /// The system ran out of memory or a similar bounded resource.
  #[error("resources exhausted while accessing store entry '{key}': {source}")]
  ResourceExhausted {
    key: String,
    #[source]
    source: io::Error,
  },

  /// The entry exists but its bytes do not decode.
  #[error("store entry '{key}' is corrupt: {source}")]
  Corrupt {
    key: String,
    #[source]
    source: CanonicalError,
  },

  /// A value could not be encoded for storage.
  #[error("failed to encode value for store entry '{key}': {source}")]
  Encode {
    key: String,
    #[source]
    source: CanonicalError,
  },

  /// The store was used after being closed.
  #[error("store entry '{key}' used after close")]
  Closed { key: String },
}

impl StoreError {
  /// Map an I/O error from reading `key`.
  pub fn read_failed(key: &str, source: io::Error) -> Self {
    if source.kind() == io::ErrorKind::OutOfMemory {
      Self::ResourceExhausted {
        key: key.to_string(),
        source,
      }
    } else {
      Self::Read {
        key: key.to_string(),
        source,
      }
    }
  }

  /// Map an I/O error from writing `key`.
  pub fn write_failed(key: &str, source: io::Error) -> Self {
    if source.kind() == io::ErrorKind::OutOfMemory {
      Self::ResourceExhausted {
        key: key.to_string(),
        source,
      }
    } else {
      Self::Write {
        key: key.to_string(),
        source,
      }
    }
  }

  /// Whether the fault belongs to the class that recomputation can recover
  /// from: corrupt entries and transient resource exhaustion.
  pub fn is_recoverable(&self) -> bool {
    matches!(self, Self::Corrupt { .. } | Self::ResourceExhausted { .. })
  }
}

/// One opaque byte entry.
pub trait CacheStore: Send {
  /// Key or path identifying the entry, for diagnostics.
  fn key(&self) -> &str;

  /// Whether the entry currently holds a value.
  fn exists(&self) -> bool;

  /// Read the entry. Returns `Ok(None)` if it was never written.
  fn read(&self) -> Result<Option<Vec<u8>>, StoreError>;

  /// Replace the entry unconditionally.
  fn write(&self, bytes: &[u8]) -> Result<(), StoreError>;

  /// Release the store. Idempotent.
  fn close(&mut self);
}

/// Hands out stores by key.
pub trait CacheStoreFactory {
  fn make(&self, key: &str) -> Box<dyn CacheStore>;

  /// A factory whose keys are namespaced under `key`.
  fn sub(&self, key: &str) -> Box<dyn CacheStoreFactory>;
}

/// Read and decode a canonical value.
///
/// Undecodable bytes are reported as [`StoreError::Corrupt`].
pub fn read_value<T: DeserializeOwned>(store: &dyn CacheStore) -> Result<Option<T>, StoreError> {
  let Some(bytes) = store.read()? else {
    return Ok(None);
  };
  from_canonical_slice(&bytes).map(Some).map_err(|source| StoreError::Corrupt {
    key: store.key().to_string(),
    source,
  })
}

/// Encode a value canonically and write it.
pub fn write_value<T: Serialize + ?Sized>(store: &dyn CacheStore, value: &T) -> Result<(), StoreError> {
  let bytes = to_canonical_vec(value).map_err(|source| StoreError::Encode {
    key: store.key().to_string(),
    source,
  })?;
  store.write(&bytes)
}
