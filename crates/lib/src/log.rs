//! Diagnostic sinks.
//!
//! Every operation that reports to the user takes a `&dyn Logger` parameter.
//! There is no process-wide default: the outermost caller constructs a
//! [`TracingLogger`] (or any other sink) and threads it through.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Severity of a diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
  Trace,
  Verbose,
  Info,
  Success,
  Warn,
  Error,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Trace => "trace",
      Self::Verbose => "verbose",
      Self::Info => "info",
      Self::Success => "success",
      Self::Warn => "warn",
      Self::Error => "error",
    };
    write!(f, "{}", name)
  }
}

/// A leveled text sink for user-facing diagnostics.
pub trait Logger: Send + Sync {
  fn log(&self, level: Level, message: &str);

  fn trace(&self, message: &str) {
    self.log(Level::Trace, message);
  }

  fn verbose(&self, message: &str) {
    self.log(Level::Verbose, message);
  }

  fn info(&self, message: &str) {
    self.log(Level::Info, message);
  }

  fn success(&self, message: &str) {
    self.log(Level::Success, message);
  }

  fn warn(&self, message: &str) {
    self.log(Level::Warn, message);
  }

  fn error(&self, message: &str) {
    self.log(Level::Error, message);
  }
}

/// Forwards diagnostics to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
  fn log(&self, level: Level, message: &str) {
    match level {
      Level::Trace => tracing::trace!("{}", message),
      Level::Verbose => tracing::debug!("{}", message),
      Level::Info => tracing::info!("{}", message),
      Level::Success => tracing::info!(outcome = "success", "{}", message),
      Level::Warn => tracing::warn!("{}", message),
      Level::Error => tracing::error!("{}", message),
    }
  }
}

/// A captured diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
  pub level: Level,
  pub message: String,
}

/// Collects diagnostics in memory.
///
/// Useful for replaying diagnostics after an invocation and for tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
  lines: Mutex<Vec<LogLine>>,
}

impl MemoryLogger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Snapshot of all captured lines, oldest first.
  pub fn lines(&self) -> Vec<LogLine> {
    self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Messages captured at the given level.
  pub fn messages(&self, level: Level) -> Vec<String> {
    self
      .lines()
      .into_iter()
      .filter(|line| line.level == level)
      .map(|line| line.message)
      .collect()
  }

  /// Whether any line at `level` contains `needle`.
  pub fn contains(&self, level: Level, needle: &str) -> bool {
    self.messages(level).iter().any(|m| m.contains(needle))
  }
}

impl Logger for MemoryLogger {
  fn log(&self, level: Level, message: &str) {
    self
      .lines
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(LogLine {
        level,
        message: message.to_string(),
      });
  }
}
