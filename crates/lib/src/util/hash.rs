//! Content hashing.
//!
//! - `Fingerprint`: a truncated 40-character hash of a value's canonical text
//! - `Hashable`: computes a `Fingerprint` for any serializable value
//! - `hash_bytes()`: full hash of arbitrary bytes

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::canonical::{CanonicalError, to_canonical_vec};
use crate::consts::FINGERPRINT_LEN;

/// A stable content hash of logical inputs.
///
/// The hash is a 40-character truncated SHA-256 of the canonical encoding,
/// lowercase hex, e.g. `"a1b2c3d4e5f6789012ab..."`. It never depends on
/// object identity or map iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<Fingerprint, CanonicalError> {
    let canonical = to_canonical_vec(self)?;
    Ok(fingerprint_bytes(&canonical))
  }
}

/// Truncated digest of raw bytes.
pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
  let mut full = hash_bytes(data);
  full.truncate(FINGERPRINT_LEN);
  Fingerprint(full)
}

/// Full 64-character SHA-256 of arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}
