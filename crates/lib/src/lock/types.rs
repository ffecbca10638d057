//! Lock file content.
//!
//! # Lock File Format
//!
//! ```text
//! {
//!   "version": "1",
//!   "hash": "5f0c6e1a...",
//!   "modules": {
//!     "2.13.8": [{"module": {"organization": "orgA", "name": "libX", "revision": "1.2.3", ...}, "artifacts": [{"artifact": {...}, "checksum": "abc123"}]}]
//!   }
//! }
//! ```
//!
//! `hash` is the fingerprint of the inputs that produced the content. Module
//! lists are keyed by target version.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::LOCK_FORMAT_VERSION;
use crate::resolution::{Artifact, ModuleId, ModuleReport, UpdateReport};
use crate::util::hash::Fingerprint;

/// A resolved artifact and its checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
  pub artifact: Artifact,
  pub checksum: String,
}

/// A module pinned by the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
  pub module: ModuleId,
  pub artifacts: Vec<ArtifactInfo>,
}

impl ResolvedModule {
  pub fn from_report(report: &ModuleReport) -> Self {
    Self {
      module: report.module.clone(),
      artifacts: report
        .artifacts
        .iter()
        .map(|a| ArtifactInfo {
          artifact: a.artifact.clone(),
          checksum: a.checksum.clone(),
        })
        .collect(),
    }
  }
}

/// Parsed lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFileContent {
  /// Lock file format version.
  pub version: String,
  /// Fingerprint of the inputs this content was produced from.
  pub hash: Fingerprint,
  /// Pinned modules, keyed by target version.
  #[serde(rename = "modules")]
  pub dependencies: BTreeMap<String, Vec<ResolvedModule>>,
}

impl LockFileContent {
  /// Empty content for the given fingerprint.
  pub fn new(hash: Fingerprint) -> Self {
    Self {
      version: LOCK_FORMAT_VERSION.to_string(),
      hash,
      dependencies: BTreeMap::new(),
    }
  }

  /// Content pinning every retained module of `report` under `version_key`.
  pub fn from_report(hash: Fingerprint, version_key: &str, report: &UpdateReport) -> Self {
    let modules = report.retained().map(ResolvedModule::from_report).collect();
    Self::new(hash).with_modules(version_key, modules)
  }

  pub fn with_modules(mut self, version_key: &str, modules: Vec<ResolvedModule>) -> Self {
    self.dependencies.insert(version_key.to_string(), modules);
    self
  }

  pub fn modules(&self, version_key: &str) -> Option<&[ResolvedModule]> {
    self.dependencies.get(version_key).map(Vec::as_slice)
  }

  /// Total number of pinned modules across all version keys.
  pub fn module_count(&self) -> usize {
    self.dependencies.values().map(Vec::len).sum()
  }
}

/// Explicit dependency lists derived from lock content, keyed by target version.
pub type ExplicitDependencies = BTreeMap<String, Vec<ModuleId>>;

/// Pin one module for explicit declaration.
///
/// Immutable modules become intransitive and forced. Mutable ones (changing
/// or snapshot revisions) keep their flags, since their revision string does
/// not identify their content.
pub fn pin_module(module: &ModuleId) -> ModuleId {
  if module.is_mutable() {
    module.clone()
  } else {
    module.clone().with_transitive(false).with_force(true)
  }
}

/// Derive the explicit dependency view of lock content.
pub fn explicit_dependencies(content: &LockFileContent) -> ExplicitDependencies {
  content
    .dependencies
    .iter()
    .map(|(key, modules)| (key.clone(), modules.iter().map(|m| pin_module(&m.module)).collect()))
    .collect()
}
