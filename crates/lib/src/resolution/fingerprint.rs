//! Fingerprints of resolution inputs.

use thiserror::Error;
use tracing::debug;

use super::types::{ModuleSettings, ResolutionInput};
use crate::log::Logger;
use crate::util::canonical::CanonicalError;
use crate::util::hash::{Fingerprint, Hashable};

/// Errors that can occur while fingerprinting.
#[derive(Debug, Error)]
pub enum FingerprintError {
  /// Only inline dependency declarations can be fingerprinted.
  #[error("dependency locking requires inline module settings, found {settings}")]
  ConfigurationUnsupported { settings: String },

  /// The input could not be encoded.
  #[error("failed to encode resolution input: {0}")]
  Encode(#[from] CanonicalError),
}

impl Hashable for ResolutionInput {}

/// Compute the stable fingerprint of a resolution input.
///
/// The whole record (configuration, module settings and resolution config)
/// is canonically encoded, hashed, and truncated to 40 hex characters.
///
/// # Errors
///
/// Returns [`FingerprintError::ConfigurationUnsupported`] (after logging it)
/// when the module settings are not the inline variant.
pub fn fingerprint(input: &ResolutionInput, log: &dyn Logger) -> Result<Fingerprint, FingerprintError> {
  match &input.module_settings {
    ModuleSettings::Inline(_) => {}
    ModuleSettings::ExternalDescriptor(_) => {
      let err = FingerprintError::ConfigurationUnsupported {
        settings: input.module_settings.describe(),
      };
      log.error(&err.to_string());
      return Err(err);
    }
  }

  let hash = input.compute_hash()?;
  debug!(hash = %hash, "fingerprinted resolution input");
  Ok(hash)
}
