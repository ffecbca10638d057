//! Pinning a resolution request to a lock file.
//!
//! Application replaces the request's explicit dependencies with the lock's
//! [`explicit_dependencies`] view for the request's target version. Whether
//! the pinned request can also be frozen is decided separately by
//! [`freeze_decision`].

use tracing::debug;

use super::LockError;
use super::types::{LockFileContent, explicit_dependencies};
use crate::log::Logger;
use crate::resolution::{ModuleId, ModuleSettings, ResolveRequest};

/// A request pinned to lock file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedLock {
  /// The request with its dependencies replaced by pinned modules.
  pub request: ResolveRequest,
  /// Modules as recorded in the lock file, flags untouched.
  pub locked: Vec<ModuleId>,
}

impl AppliedLock {
  /// The pinned dependency list of the rewritten request.
  pub fn pinned(&self) -> &[ModuleId] {
    match &self.request.module_settings {
      ModuleSettings::Inline(settings) => &settings.dependencies,
      ModuleSettings::ExternalDescriptor(_) => &[],
    }
  }
}

/// Whether a pinned request may be frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeDecision {
  /// No pinned module re-resolves transitively.
  Freeze,
  /// These modules are still transitive, so resolution cannot be frozen.
  Skip { transitive: Vec<ModuleId> },
}

/// Pin `request` to a lock file already confirmed fresh.
///
/// Returns `Ok(None)` with a warning when the request does not use inline
/// settings with a target version, since such requests cannot be pinned.
///
/// # Errors
///
/// Returns [`LockError::MissingLockedVersion`] if the lock file has no
/// modules for the request's target version.
pub fn apply_lock(
  lock: &LockFileContent,
  request: &ResolveRequest,
  log: &dyn Logger,
) -> Result<Option<AppliedLock>, LockError> {
  let settings = match &request.module_settings {
    ModuleSettings::Inline(settings) => settings,
    ModuleSettings::ExternalDescriptor(_) => {
      log.warn(&format!(
        "Dependency lock file cannot be applied to {}; resolving without it",
        request.module_settings.describe()
      ));
      return Ok(None);
    }
  };
  let Some(version_key) = settings.target_version.as_deref() else {
    log.warn(&format!(
      "Dependency lock file cannot be applied to {}: no target version declared; resolving without it",
      settings.project
    ));
    return Ok(None);
  };

  let Some(locked) = lock.modules(version_key) else {
    let err = LockError::MissingLockedVersion {
      version: version_key.to_string(),
      available: lock.dependencies.keys().cloned().collect(),
    };
    log.error(&err.to_string());
    return Err(err);
  };

  let mut explicit = explicit_dependencies(lock);
  let pinned = explicit.remove(version_key).unwrap_or_default();
  debug!(version = version_key, count = pinned.len(), "pinning dependencies from lock file");

  let mut pinned_settings = settings.clone();
  pinned_settings.dependencies = pinned;

  Ok(Some(AppliedLock {
    request: ResolveRequest {
      module_settings: ModuleSettings::Inline(pinned_settings),
      configuration: request.configuration.clone(),
    },
    locked: locked.iter().map(|m| m.module.clone()).collect(),
  }))
}

/// Decide whether resolution of `pinned` modules can be frozen.
pub fn freeze_decision(pinned: &[ModuleId]) -> FreezeDecision {
  let transitive: Vec<ModuleId> = pinned.iter().filter(|m| m.transitive).cloned().collect();
  if transitive.is_empty() {
    FreezeDecision::Freeze
  } else {
    FreezeDecision::Skip { transitive }
  }
}

/// Freeze `request` if its pinned modules allow it, warning otherwise.
///
/// Returns whether the request was frozen.
pub fn apply_freeze(request: &mut ResolveRequest, pinned: &[ModuleId], log: &dyn Logger) -> bool {
  match freeze_decision(pinned) {
    FreezeDecision::Freeze => {
      request.freeze();
      log.verbose("All dependencies are pinned; resolution is frozen");
      true
    }
    FreezeDecision::Skip { transitive } => {
      let names: Vec<String> = transitive.iter().map(ToString::to_string).collect();
      log.warn(&format!(
        "Resolution is not frozen because these locked modules are transitive: {}",
        names.join(", ")
      ));
      false
    }
  }
}
