//! In-process stores.
//!
//! Handles to the same [`MemoryStore`] share contents and counters, so a
//! caller can keep one handle to inspect what happened through another.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{CacheStore, CacheStoreFactory, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
  bytes: Option<Vec<u8>>,
  reads: usize,
  writes: usize,
  closes: usize,
  read_fault: Option<io::ErrorKind>,
  write_fault: Option<io::ErrorKind>,
}

/// A store holding its entry in memory.
#[derive(Debug)]
pub struct MemoryStore {
  key: String,
  state: Arc<Mutex<MemoryState>>,
  open: bool,
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::named("memory")
  }

  pub fn named(key: &str) -> Self {
    Self {
      key: key.to_string(),
      state: Arc::default(),
      open: true,
    }
  }

  pub fn with_bytes(bytes: Vec<u8>) -> Self {
    let store = Self::new();
    store.set_bytes(bytes);
    store
  }

  /// A new open handle sharing this store's contents.
  pub fn handle(&self) -> Self {
    Self {
      key: self.key.clone(),
      state: Arc::clone(&self.state),
      open: true,
    }
  }

  fn state(&self) -> MutexGuard<'_, MemoryState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn bytes(&self) -> Option<Vec<u8>> {
    self.state().bytes.clone()
  }

  /// Replace the contents without counting a write.
  pub fn set_bytes(&self, bytes: Vec<u8>) {
    self.state().bytes = Some(bytes);
  }

  /// Make the next read fail with an I/O error of `kind`.
  pub fn fail_next_read(&self, kind: io::ErrorKind) {
    self.state().read_fault = Some(kind);
  }

  /// Make the next write fail with an I/O error of `kind`, leaving the
  /// contents unchanged.
  pub fn fail_next_write(&self, kind: io::ErrorKind) {
    self.state().write_fault = Some(kind);
  }

  pub fn read_count(&self) -> usize {
    self.state().reads
  }

  pub fn write_count(&self) -> usize {
    self.state().writes
  }

  /// Number of handles closed so far.
  pub fn close_count(&self) -> usize {
    self.state().closes
  }
}

impl CacheStore for MemoryStore {
  fn key(&self) -> &str {
    &self.key
  }

  fn exists(&self) -> bool {
    self.state().bytes.is_some()
  }

  fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
    if !self.open {
      return Err(StoreError::Closed { key: self.key.clone() });
    }
    let mut state = self.state();
    state.reads += 1;
    if let Some(kind) = state.read_fault.take() {
      return Err(StoreError::read_failed(&self.key, io::Error::from(kind)));
    }
    Ok(state.bytes.clone())
  }

  fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
    if !self.open {
      return Err(StoreError::Closed { key: self.key.clone() });
    }
    let mut state = self.state();
    if let Some(kind) = state.write_fault.take() {
      return Err(StoreError::write_failed(&self.key, io::Error::from(kind)));
    }
    state.writes += 1;
    state.bytes = Some(bytes.to_vec());
    Ok(())
  }

  fn close(&mut self) {
    if self.open {
      self.open = false;
      self.state().closes += 1;
    }
  }
}

/// Hands out [`MemoryStore`]s, one shared entry per key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreFactory {
  prefix: String,
  slots: Arc<Mutex<BTreeMap<String, MemoryStore>>>,
}

impl MemoryStoreFactory {
  pub fn new() -> Self {
    Self::default()
  }

  fn full_key(&self, key: &str) -> String {
    if self.prefix.is_empty() {
      key.to_string()
    } else {
      format!("{}/{}", self.prefix, key)
    }
  }

  /// A handle to the entry under `key`, creating it if needed.
  pub fn slot(&self, key: &str) -> MemoryStore {
    let full_key = self.full_key(key);
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots
      .entry(full_key.clone())
      .or_insert_with(|| MemoryStore::named(&full_key))
      .handle()
  }
}

impl CacheStoreFactory for MemoryStoreFactory {
  fn make(&self, key: &str) -> Box<dyn CacheStore> {
    Box::new(self.slot(key))
  }

  fn sub(&self, key: &str) -> Box<dyn CacheStoreFactory> {
    Box::new(Self {
      prefix: self.full_key(key),
      slots: Arc::clone(&self.slots),
    })
  }
}
