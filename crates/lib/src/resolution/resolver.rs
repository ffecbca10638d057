//! Boundaries to the external resolver and post-resolution reporters.

use std::path::Path;

use super::types::{LogicalClock, ResolutionConfig, ResolveRequest, UnresolvedWarning, UnresolvedWarningConfig, UpdateReport};
use crate::log::Logger;

/// The external module resolver.
///
/// Computes the dependency graph and downloads artifacts. Any parallelism or
/// timeouts live behind this trait.
pub trait Resolver {
  fn resolve(
    &self,
    request: &ResolveRequest,
    resolution: &ResolutionConfig,
    diagnostics: &UnresolvedWarningConfig,
    clock: LogicalClock,
    dep_dir: Option<&Path>,
    log: &dyn Logger,
  ) -> Result<UpdateReport, UnresolvedWarning>;
}

impl<F> Resolver for F
where
  F: Fn(&ResolveRequest) -> Result<UpdateReport, UnresolvedWarning>,
{
  fn resolve(
    &self,
    request: &ResolveRequest,
    _resolution: &ResolutionConfig,
    _diagnostics: &UnresolvedWarningConfig,
    _clock: LogicalClock,
    _dep_dir: Option<&Path>,
    _log: &dyn Logger,
  ) -> Result<UpdateReport, UnresolvedWarning> {
    self(request)
  }
}

/// Consumes a successful report, e.g. to print eviction or binary
/// compatibility warnings. Reporters only log; they never alter the result.
pub trait UpdateReporter {
  fn report(&self, report: &UpdateReport, log: &dyn Logger);
}
