//! Dependency lock files.
//!
//! A lock file pins the modules of a resolution so other machines resolve
//! exactly the same set. It is keyed by the fingerprint of the resolution
//! inputs; content whose hash differs from the current fingerprint is stale
//! and treated as absent.
//!
//! # Modules
//!
//! - [`types`] - Lock content and its explicit dependency view
//! - [`store`] - Typed reads and writes through a persistent store
//! - [`apply`] - Pinning and freezing resolution requests

pub mod apply;
pub mod store;
pub mod types;

use thiserror::Error;

use crate::resolution::fingerprint::FingerprintError;
use crate::store::StoreError;

pub use apply::{AppliedLock, FreezeDecision, apply_freeze, apply_lock, freeze_decision};
pub use store::LockFileStore;
pub use types::{ArtifactInfo, ExplicitDependencies, LockFileContent, ResolvedModule, explicit_dependencies};

/// Errors that can occur when working with lock files.
#[derive(Debug, Error)]
pub enum LockError {
  /// The lock file does not cover the target version in use.
  #[error("lock file has no modules for version {version} (locked versions: {})", .available.join(", "))]
  MissingLockedVersion { version: String, available: Vec<String> },

  /// The resolution input could not be fingerprinted.
  #[error(transparent)]
  Fingerprint(#[from] FingerprintError),

  /// The lock file could not be written.
  #[error("failed to write lock file: {0}")]
  Store(#[from] StoreError),
}
