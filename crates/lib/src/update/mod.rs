//! Dependency update orchestration.
//!
//! One call to [`update`] runs a single resolution step:
//!
//! 1. note whether the lock file target already exists
//! 2. fingerprint the inputs and read the lock file if it is fresh
//! 3. pin (and possibly freeze) the request to the lock file
//! 4. resolve through the [`ResolutionCache`]
//! 5. write a lock file on the first successful resolution
//! 6. run reporters
//!
//! The cache is keyed by the fingerprint of the inputs, the same key as the
//! lock file, so applying a lock never invalidates cached output. The
//! resolver is reached on every cache miss, whether or not a lock file was
//! applied. Both the lock store and the cache slots are owned by guards
//! that close them on every exit path.

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CacheError, CacheOptions, CacheStatus, ResolutionCache};
use crate::lock::{LockError, LockFileContent, LockFileStore, apply_freeze, apply_lock};
use crate::log::Logger;
use crate::resolution::fingerprint::{FingerprintError, fingerprint};
use crate::resolution::resolver::{Resolver, UpdateReporter};
use crate::resolution::{
  LogicalClock, ResolutionInput, ResolveRequest, UnresolvedWarning, UnresolvedWarningConfig, UpdateReport,
};
use crate::store::{CacheStore, CacheStoreFactory};
use crate::util::hash::Fingerprint;

/// Options for the update operation.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
  /// Reuse the last resolution verbatim.
  pub skip: bool,
  /// Always resolve again. Overrides `skip`.
  pub force: bool,
  /// Dependencies changed outside the tracked inputs.
  pub deps_updated: bool,
  /// Directory the resolver may use for downloaded dependencies.
  pub dep_dir: Option<PathBuf>,
  /// Passed through to the resolver.
  pub clock: LogicalClock,
  /// How the resolver renders unresolved dependencies.
  pub diagnostics: UnresolvedWarningConfig,
}

impl UpdateOptions {
  fn cache_options(&self) -> CacheOptions {
    CacheOptions {
      skip: self.skip,
      force: self.force,
      deps_updated: self.deps_updated,
    }
  }
}

/// Result of a successful update.
#[derive(Debug)]
pub struct UpdateOutcome {
  pub report: UpdateReport,
  /// Which cache path produced the report.
  pub status: CacheStatus,
  /// Fingerprint of the inputs.
  pub hash: Fingerprint,
  /// Whether a lock file was written by this run.
  pub lock_written: bool,
  /// Whether the request was pinned to a lock file.
  pub pinned: bool,
  /// Whether the pinned request was frozen.
  pub frozen: bool,
}

/// Errors that can occur during update.
#[derive(Debug, Error)]
pub enum UpdateError {
  /// The resolver could not resolve every dependency.
  #[error("failed to resolve dependencies: {0}")]
  ResolutionFailed(#[source] UnresolvedWarning),

  /// A freshly written lock file could not be read back.
  #[error("lock file '{key}' could not be read back after writing")]
  LockVerification { key: String },

  /// The inputs could not be fingerprinted.
  #[error(transparent)]
  Fingerprint(#[from] FingerprintError),

  /// The lock file could not be applied or written.
  #[error(transparent)]
  Lock(#[from] LockError),

  /// The resolution cache failed.
  #[error(transparent)]
  Cache(#[from] CacheError),
}

/// Run one resolution step for `input`.
///
/// `lock_store` holds the lock file; `cache_factory` provides the
/// `inputs`/`output` cache slots. Reporters run in order after a successful
/// resolution and only log.
///
/// # Errors
///
/// Returns an error if:
/// - the inputs are not inline declarations
/// - a fresh lock file does not cover the target version
/// - the resolver reports unresolved dependencies
/// - reuse was requested without a previous resolution
/// - a written lock file cannot be read back
pub fn update(
  input: &ResolutionInput,
  lock_store: Box<dyn CacheStore>,
  cache_factory: &dyn CacheStoreFactory,
  resolver: &dyn Resolver,
  reporters: &[&dyn UpdateReporter],
  options: &UpdateOptions,
  log: &dyn Logger,
) -> Result<UpdateOutcome, UpdateError> {
  let started = Instant::now();
  let lock_existed = lock_store.exists();
  let lock = LockFileStore::open(lock_store);

  let hash = fingerprint(input, log)?;
  let fresh = lock.get_matching(&hash);
  info!(hash = %hash, lock = lock.key(), fresh = fresh.is_some(), "starting dependency update");

  let mut request = ResolveRequest::from_input(input);
  let mut pinned = false;
  let mut frozen = false;
  if let Some(content) = &fresh
    && let Some(applied) = apply_lock(content, &request, log)?
  {
    log.info(&format!(
      "Applying dependency lock file {} ({} modules)",
      lock.key(),
      applied.locked.len()
    ));
    let mut working = applied.request.clone();
    frozen = apply_freeze(&mut working, applied.pinned(), log);
    request = working;
    pinned = true;
  }

  let cache = ResolutionCache::open(cache_factory);
  let resolved = cache.get_or_compute(input, options.cache_options(), log, || {
    debug!(frozen = request.configuration.frozen, "invoking resolver");
    resolver
      .resolve(
        &request,
        &input.resolution_config,
        &options.diagnostics,
        options.clock,
        options.dep_dir.as_deref(),
        log,
      )
      .map_err(UpdateError::ResolutionFailed)
  });

  let (report, status) = match resolved {
    Ok(found) => found,
    Err(err) => {
      cache.close();
      lock.close();
      if let UpdateError::ResolutionFailed(warning) = &err {
        for line in &warning.lines {
          log.error(line);
        }
        log.error(&warning.to_string());
      }
      return Err(err);
    }
  };
  cache.close();

  let lock_written = if lock_existed {
    if fresh.is_none() {
      log.warn(&format!(
        "Dependency lock file {} is out of date and was left unchanged; delete it to lock the new resolution",
        lock.key()
      ));
    }
    false
  } else {
    write_lock(&lock, &hash, input, &report, log)?
  };

  log.verbose(&format!(
    "Dependency update took {} ms (resolve {} ms, download {} ms)",
    started.elapsed().as_millis(),
    report.stats.resolve_time_ms,
    report.stats.download_time_ms
  ));
  for reporter in reporters {
    reporter.report(&report, log);
  }
  lock.close();

  log.success(&format!("Resolved {} modules", report.retained().count()));
  Ok(UpdateOutcome {
    report,
    status,
    hash,
    lock_written,
    pinned,
    frozen,
  })
}

/// Write the first lock file for `report` and verify it reads back.
///
/// Returns whether anything was written.
fn write_lock(
  lock: &LockFileStore,
  hash: &Fingerprint,
  input: &ResolutionInput,
  report: &UpdateReport,
  log: &dyn Logger,
) -> Result<bool, UpdateError> {
  if report.retained().next().is_none() {
    debug!("no modules resolved, not writing lock file");
    return Ok(false);
  }
  let Some(version_key) = input
    .module_settings
    .as_inline()
    .and_then(|settings| settings.target_version.as_deref())
  else {
    log.verbose("No target version declared; not writing a dependency lock file");
    return Ok(false);
  };

  let content = LockFileContent::from_report(hash.clone(), version_key, report);
  lock.write(&content)?;
  if lock.get_matching(hash).is_none() {
    let err = UpdateError::LockVerification {
      key: lock.key().to_string(),
    };
    log.error(&err.to_string());
    return Err(err);
  }

  info!(lock = lock.key(), modules = content.module_count(), "wrote lock file");
  log.info(&format!("Wrote dependency lock file {}", lock.key()));
  Ok(true)
}
