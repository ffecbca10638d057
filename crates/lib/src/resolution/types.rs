//! Core resolution types.
//!
//! - [`ResolutionInput`]: the immutable record fingerprinted per invocation
//! - [`ResolveRequest`]: the working copy handed to the resolver, which lock
//!   application may pin and freeze
//! - [`UpdateReport`] / [`UnresolvedWarning`]: what the resolver returns

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MUTABLE_VERSION_MARKERS;

fn default_true() -> bool {
  true
}

/// A module coordinate plus its resolution flags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId {
  pub organization: String,
  pub name: String,
  pub revision: String,
  /// Whether the module's own dependencies are resolved too.
  #[serde(default = "default_true")]
  pub transitive: bool,
  /// Whether this revision wins over conflicting ones.
  #[serde(default)]
  pub force: bool,
  /// Whether the artifact may change under the same revision.
  #[serde(default)]
  pub changing: bool,
}

impl ModuleId {
  /// A transitive, unforced, non-changing module.
  pub fn new(organization: &str, name: &str, revision: &str) -> Self {
    Self {
      organization: organization.to_string(),
      name: name.to_string(),
      revision: revision.to_string(),
      transitive: true,
      force: false,
      changing: false,
    }
  }

  pub fn with_transitive(mut self, transitive: bool) -> Self {
    self.transitive = transitive;
    self
  }

  pub fn with_force(mut self, force: bool) -> Self {
    self.force = force;
    self
  }

  pub fn with_changing(mut self, changing: bool) -> Self {
    self.changing = changing;
    self
  }

  /// Whether the content behind this revision can mutate.
  ///
  /// True for modules flagged `changing` and for revisions ending in a
  /// mutable-version marker such as `-SNAPSHOT`.
  pub fn is_mutable(&self) -> bool {
    self.changing
      || MUTABLE_VERSION_MARKERS
        .iter()
        .any(|marker| self.revision.ends_with(marker))
  }
}

impl fmt::Display for ModuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.organization, self.name, self.revision)
  }
}

/// Describes one downloadable file of a module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Artifact {
  pub name: String,
  /// Artifact kind, e.g. `jar`, `src`, `doc`.
  #[serde(rename = "type")]
  pub kind: String,
  pub extension: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub classifier: Option<String>,
}

impl Artifact {
  /// A plain `jar` artifact named after the module.
  pub fn jar(name: &str) -> Self {
    Self {
      name: name.to_string(),
      kind: "jar".to_string(),
      extension: "jar".to_string(),
      classifier: None,
    }
  }

  pub fn with_classifier(mut self, classifier: &str) -> Self {
    self.classifier = Some(classifier.to_string());
    self
  }
}

impl fmt::Display for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.classifier {
      Some(classifier) => write!(f, "{}-{}.{} ({})", self.name, classifier, self.extension, self.kind),
      None => write!(f, "{}.{} ({})", self.name, self.extension, self.kind),
    }
  }
}

/// Dependencies declared inline in the build definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineSettings {
  /// The project being resolved.
  pub project: ModuleId,
  /// Explicitly declared dependencies.
  pub dependencies: Vec<ModuleId>,
  /// Target language/platform version the dependencies are resolved for.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_version: Option<String>,
}

/// Dependencies declared in an external descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSettings {
  pub file: PathBuf,
  #[serde(default)]
  pub validate: bool,
}

/// How the project's dependencies are declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModuleSettings {
  /// Inline declarations; the only variant that can be fingerprinted or pinned.
  Inline(InlineSettings),
  /// Declarations in a descriptor file.
  ExternalDescriptor(DescriptorSettings),
}

impl ModuleSettings {
  pub fn as_inline(&self) -> Option<&InlineSettings> {
    match self {
      Self::Inline(settings) => Some(settings),
      Self::ExternalDescriptor(_) => None,
    }
  }

  /// Short description for diagnostics.
  pub fn describe(&self) -> String {
    match self {
      Self::Inline(settings) => format!("inline settings for {}", settings.project),
      Self::ExternalDescriptor(settings) => format!("descriptor file {}", settings.file.display()),
    }
  }
}

/// Options for a single update step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfiguration {
  /// Continue when some artifacts cannot be retrieved.
  #[serde(default)]
  pub missing_ok: bool,
  /// Disable transitive re-resolution and change detection.
  #[serde(default)]
  pub frozen: bool,
}

/// A repository the resolver may consult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
  pub name: String,
  pub root: String,
}

impl Repository {
  pub fn new(name: &str, root: &str) -> Self {
    Self {
      name: name.to_string(),
      root: root.to_string(),
    }
  }
}

/// Resolver-side configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
  pub repositories: Vec<Repository>,
  #[serde(default)]
  pub offline: bool,
}

/// Logical inputs of one resolution step.
///
/// Constructed fresh per invocation and never mutated; its fingerprint keys
/// the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionInput {
  pub configuration: UpdateConfiguration,
  pub module_settings: ModuleSettings,
  pub resolution_config: ResolutionConfig,
}

impl ResolutionInput {
  pub fn new(
    configuration: UpdateConfiguration,
    module_settings: ModuleSettings,
    resolution_config: ResolutionConfig,
  ) -> Self {
    Self {
      configuration,
      module_settings,
      resolution_config,
    }
  }
}

/// The working request passed to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
  pub module_settings: ModuleSettings,
  pub configuration: UpdateConfiguration,
}

impl ResolveRequest {
  pub fn from_input(input: &ResolutionInput) -> Self {
    Self {
      module_settings: input.module_settings.clone(),
      configuration: input.configuration.clone(),
    }
  }

  /// Disable transitive re-resolution and change detection.
  pub fn freeze(&mut self) {
    self.configuration.frozen = true;
  }
}

/// Opaque resolver clock; resolvers use it to decide whether remote
/// metadata must be refreshed. Not part of any cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalClock(pub u64);

impl LogicalClock {
  pub fn unknown() -> Self {
    Self(0)
  }
}

/// Controls how the resolver renders unresolved-dependency diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnresolvedWarningConfig {
  /// Include where each failed dependency was declared.
  pub show_source_positions: bool,
}

/// One artifact file produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
  pub artifact: Artifact,
  pub file: PathBuf,
  pub checksum: String,
}

/// Resolution result for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReport {
  pub module: ModuleId,
  pub artifacts: Vec<ResolvedArtifact>,
  #[serde(default)]
  pub evicted: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub eviction_reason: Option<String>,
}

impl ModuleReport {
  pub fn new(module: ModuleId, artifacts: Vec<ResolvedArtifact>) -> Self {
    Self {
      module,
      artifacts,
      evicted: false,
      eviction_reason: None,
    }
  }

  pub fn evicted(mut self, reason: &str) -> Self {
    self.evicted = true;
    self.eviction_reason = Some(reason.to_string());
    self
  }
}

/// Timing and size figures of a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStats {
  pub resolve_time_ms: u64,
  pub download_time_ms: u64,
  pub download_size: u64,
}

/// Output of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
  /// Descriptor file the resolver wrote for this resolution.
  pub cached_descriptor: PathBuf,
  pub modules: Vec<ModuleReport>,
  #[serde(default)]
  pub stats: UpdateStats,
}

impl UpdateReport {
  pub fn new(cached_descriptor: PathBuf, modules: Vec<ModuleReport>) -> Self {
    Self {
      cached_descriptor,
      modules,
      stats: UpdateStats::default(),
    }
  }

  /// Modules that survived conflict eviction.
  pub fn retained(&self) -> impl Iterator<Item = &ModuleReport> {
    self.modules.iter().filter(|m| !m.evicted)
  }

  /// Modules evicted by conflict resolution.
  pub fn evicted(&self) -> impl Iterator<Item = &ModuleReport> {
    self.modules.iter().filter(|m| m.evicted)
  }

  /// Every artifact file of retained modules, deduplicated and sorted.
  pub fn all_files(&self) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = self
      .retained()
      .flat_map(|m| m.artifacts.iter().map(|a| a.file.clone()))
      .collect();
    files.sort();
    files.dedup();
    files
  }

  pub fn descriptor(&self) -> &Path {
    &self.cached_descriptor
  }
}

impl fmt::Display for UpdateReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Update report:")?;
    writeln!(
      f,
      "\tResolve time: {} ms, Download time: {} ms, Download size: {} bytes",
      self.stats.resolve_time_ms, self.stats.download_time_ms, self.stats.download_size
    )?;
    writeln!(f, "\tdescriptor: {}", self.cached_descriptor.display())?;
    for module in &self.modules {
      match (module.evicted, module.eviction_reason.as_deref()) {
        (true, Some(reason)) => writeln!(f, "\t{} (evicted: {})", module.module, reason)?,
        (true, None) => writeln!(f, "\t{} (evicted)", module.module)?,
        _ => writeln!(f, "\t{}", module.module)?,
      }
      for artifact in &module.artifacts {
        writeln!(
          f,
          "\t\t{} [{}] -> {}",
          artifact.artifact,
          artifact.checksum,
          artifact.file.display()
        )?;
      }
    }
    Ok(())
  }
}

/// Resolver failure: some dependencies could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved dependencies: {}", join_ids(.failed))]
pub struct UnresolvedWarning {
  pub failed: Vec<ModuleId>,
  /// Human-readable diagnostic lines, emitted before failing.
  pub lines: Vec<String>,
}

impl UnresolvedWarning {
  pub fn new(failed: Vec<ModuleId>, lines: Vec<String>) -> Self {
    Self { failed, lines }
  }
}

fn join_ids(ids: &[ModuleId]) -> String {
  ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
