//! Memoized resolution.
//!
//! The cache keeps two independent store slots:
//!
//! | Slot | Contents |
//! |------|----------|
//! | `inputs` | fingerprint of the last successful inputs, plus the raw inputs |
//! | `output` | last output, the fingerprint it was computed for, and modification stamps of its files |
//!
//! A previous output is reused only if none of these hold:
//!
//! 1. the current fingerprint differs from the recorded one
//! 2. the caller forces recomputation
//! 3. the caller reports dependencies changed externally
//! 4. an output file is missing or its stamp changed
//! 5. the output's descriptor file is missing or its stamp changed
//!
//! Corrupt entries and resource exhaustion while reading cached state are
//! recovered by recomputing; every other fault propagates.

pub mod stamps;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{INPUTS_SLOT, OUTPUT_SLOT};
use crate::log::Logger;
use crate::resolution::UpdateReport;
use crate::store::{CacheStore, CacheStoreFactory, StoreError, read_value, write_value};
use crate::util::canonical::CanonicalError;
use crate::util::hash::{Fingerprint, Hashable};

use stamps::{Stamps, is_up_to_date, stamp_files};

/// Errors that can occur in the resolution cache.
#[derive(Debug, Error)]
pub enum CacheError {
  /// Reuse of the last output was requested, but none was recorded.
  #[error("skipping update requested, but update has not previously run successfully")]
  SkipWithoutHistory,

  /// The cache key could not be encoded.
  #[error("failed to encode cache key: {0}")]
  Encode(#[source] CanonicalError),

  /// A cache slot could not be read or written.
  #[error(transparent)]
  Store(#[from] StoreError),
}

impl CacheError {
  /// Whether recomputing can recover from this fault.
  pub fn is_recoverable(&self) -> bool {
    match self {
      Self::Store(e) => e.is_recoverable(),
      Self::SkipWithoutHistory | Self::Encode(_) => false,
    }
  }
}

/// Output that can be memoized.
pub trait CachedOutput: Serialize + DeserializeOwned + fmt::Display {
  /// Files making up the output.
  fn output_files(&self) -> Vec<PathBuf>;

  /// The output's own descriptor file, if any.
  fn descriptor_file(&self) -> Option<&Path>;
}

impl CachedOutput for UpdateReport {
  fn output_files(&self) -> Vec<PathBuf> {
    self.all_files()
  }

  fn descriptor_file(&self) -> Option<&Path> {
    Some(self.descriptor())
  }
}

/// Caller flags controlling reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
  /// Reuse the last output verbatim without checking staleness.
  pub skip: bool,
  /// Always recompute. Overrides `skip`.
  pub force: bool,
  /// Dependencies changed outside the tracked inputs.
  pub deps_updated: bool,
}

/// Which path produced a cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
  /// The previous output was still fresh.
  Hit,
  /// The output was stale and recomputed.
  Miss,
  /// The last output was reused on request.
  Skipped,
  /// Cached state was unusable; the output was recomputed.
  Recovered,
}

/// Why a previous output cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
  Forced,
  DependenciesUpdated,
  NoHistory,
  InputsChanged,
  FileChanged(PathBuf),
  DescriptorChanged(PathBuf),
}

impl fmt::Display for StaleReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Forced => write!(f, "recomputation forced"),
      Self::DependenciesUpdated => write!(f, "dependencies updated"),
      Self::NoHistory => write!(f, "no previous output"),
      Self::InputsChanged => write!(f, "inputs changed"),
      Self::FileChanged(path) => write!(f, "output file changed: {}", path.display()),
      Self::DescriptorChanged(path) => write!(f, "descriptor changed: {}", path.display()),
    }
  }
}

enum Lookup<T> {
  Fresh(T),
  Stale(StaleReason),
}

#[derive(Serialize)]
struct InputsEntry<'a, I> {
  fingerprint: &'a Fingerprint,
  inputs: &'a I,
}

#[derive(Deserialize)]
struct StoredInputs {
  fingerprint: Fingerprint,
}

#[derive(Serialize)]
struct OutputEntry<'a, T> {
  fingerprint: &'a Fingerprint,
  stamps: Stamps,
  output: &'a T,
}

#[derive(Deserialize)]
struct StoredOutput<T> {
  fingerprint: Fingerprint,
  stamps: Stamps,
  output: T,
}

/// Memoizes an expensive computation in the `inputs`/`output` slots.
///
/// Owns both slot stores and closes them when dropped.
pub struct ResolutionCache {
  inputs: Box<dyn CacheStore>,
  output: Box<dyn CacheStore>,
}

impl ResolutionCache {
  pub fn open(factory: &dyn CacheStoreFactory) -> Self {
    Self {
      inputs: factory.make(INPUTS_SLOT),
      output: factory.make(OUTPUT_SLOT),
    }
  }

  /// Return the memoized output for `key`, computing it when stale.
  ///
  /// `compute` runs at most once. Its error type must absorb
  /// [`CacheError`] so cache faults and computation failures travel
  /// through one channel.
  ///
  /// # Errors
  ///
  /// - [`CacheError::SkipWithoutHistory`] when `skip` is requested with no
  ///   recorded output
  /// - unrecoverable store faults
  /// - whatever `compute` returns
  pub fn get_or_compute<K, T, E, F>(
    &self,
    key: &K,
    options: CacheOptions,
    log: &dyn Logger,
    compute: F,
  ) -> Result<(T, CacheStatus), E>
  where
    K: Hashable,
    T: CachedOutput,
    E: From<CacheError>,
    F: FnOnce() -> Result<T, E>,
  {
    let fingerprint = key.compute_hash().map_err(CacheError::Encode)?;

    if options.skip && !options.force {
      return match read_value::<StoredOutput<T>>(self.output.as_ref()) {
        Ok(Some(stored)) => {
          debug!("reusing last output on request");
          Ok((stored.output, CacheStatus::Skipped))
        }
        Ok(None) => {
          let err = CacheError::SkipWithoutHistory;
          log.error(&err.to_string());
          Err(err.into())
        }
        Err(fault) if fault.is_recoverable() => self.recover(fault.into(), &fingerprint, key, log, compute),
        Err(fault) => Err(CacheError::from(fault).into()),
      };
    }

    match self.lookup::<T>(&fingerprint, options) {
      Ok(Lookup::Fresh(output)) => {
        debug!(hash = %fingerprint, "cached output is up to date");
        Ok((output, CacheStatus::Hit))
      }
      Ok(Lookup::Stale(reason)) => {
        debug!(hash = %fingerprint, %reason, "cached output is stale");
        let output = compute()?;
        self.record(&fingerprint, key, &output)?;
        Ok((output, CacheStatus::Miss))
      }
      Err(fault) if fault.is_recoverable() => self.recover(fault, &fingerprint, key, log, compute),
      Err(fault) => Err(fault.into()),
    }
  }

  fn lookup<T: CachedOutput>(&self, fingerprint: &Fingerprint, options: CacheOptions) -> Result<Lookup<T>, CacheError> {
    if options.force {
      return Ok(Lookup::Stale(StaleReason::Forced));
    }
    if options.deps_updated {
      return Ok(Lookup::Stale(StaleReason::DependenciesUpdated));
    }

    let Some(previous) = read_value::<StoredInputs>(self.inputs.as_ref())? else {
      return Ok(Lookup::Stale(StaleReason::NoHistory));
    };
    if previous.fingerprint != *fingerprint {
      return Ok(Lookup::Stale(StaleReason::InputsChanged));
    }

    let Some(stored) = read_value::<StoredOutput<T>>(self.output.as_ref())? else {
      return Ok(Lookup::Stale(StaleReason::NoHistory));
    };
    // a failed inputs write can leave another key's output behind
    if stored.fingerprint != *fingerprint {
      return Ok(Lookup::Stale(StaleReason::InputsChanged));
    }
    if let Some(file) = stored
      .output
      .output_files()
      .into_iter()
      .find(|f| !is_up_to_date(f, &stored.stamps))
    {
      return Ok(Lookup::Stale(StaleReason::FileChanged(file)));
    }
    if let Some(descriptor) = stored.output.descriptor_file()
      && !is_up_to_date(descriptor, &stored.stamps)
    {
      return Ok(Lookup::Stale(StaleReason::DescriptorChanged(descriptor.to_path_buf())));
    }

    Ok(Lookup::Fresh(stored.output))
  }

  /// Persist `output` with fresh stamps, then the fingerprint it belongs to.
  fn record<K, T>(&self, fingerprint: &Fingerprint, key: &K, output: &T) -> Result<(), CacheError>
  where
    K: Serialize,
    T: CachedOutput,
  {
    let files = output.output_files();
    let stamps = stamp_files(
      files
        .iter()
        .map(PathBuf::as_path)
        .chain(output.descriptor_file()),
    );
    write_value(
      self.output.as_ref(),
      &OutputEntry {
        fingerprint,
        stamps,
        output,
      },
    )?;
    write_value(self.inputs.as_ref(), &InputsEntry { fingerprint, inputs: key })?;
    info!(hash = %fingerprint, files = files.len(), "recorded resolution output");
    Ok(())
  }

  /// Recompute after a recoverable fault and report the fresh output.
  fn recover<K, T, E, F>(
    &self,
    fault: CacheError,
    fingerprint: &Fingerprint,
    key: &K,
    log: &dyn Logger,
    compute: F,
  ) -> Result<(T, CacheStatus), E>
  where
    K: Hashable,
    T: CachedOutput,
    E: From<CacheError>,
    F: FnOnce() -> Result<T, E>,
  {
    let output = compute()?;
    log.warn(&format!("Resolution caching failed due to: {}", fault));
    log.warn("Resolved again; the recomputed result follows:");
    for line in output.to_string().lines() {
      log.warn(line);
    }
    log.trace(&format!("{:?}", fault));

    if let Err(e) = self.record(fingerprint, key, &output) {
      log.verbose(&format!("Could not record recomputed output: {}", e));
    }
    Ok((output, CacheStatus::Recovered))
  }

  /// Close both slot stores.
  pub fn close(mut self) {
    self.inputs.close();
    self.output.close();
  }
}

impl Drop for ResolutionCache {
  fn drop(&mut self) {
    self.inputs.close();
    self.output.close();
  }
}
